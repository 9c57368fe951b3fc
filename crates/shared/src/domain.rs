use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DrawError;

/// Number of balls in one draw.
pub const DRAW_SIZE: usize = 6;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(DrawId);

impl DrawId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A single lottery ball, always within `BallNumber::MIN..=BallNumber::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BallNumber(u8);

impl BallNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 45;

    pub fn new(value: u8) -> Result<Self, DrawError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DrawError::OutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn band(self) -> ColorBand {
        ColorBand::for_number(self)
    }
}

impl TryFrom<u8> for BallNumber {
    type Error = DrawError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BallNumber> for u8 {
    fn from(value: BallNumber) -> Self {
        value.0
    }
}

impl fmt::Display for BallNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Visual category of a ball, one per block of ten numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBand {
    Band0,
    Band1,
    Band2,
    Band3,
    Band4,
}

impl ColorBand {
    pub fn for_number(number: BallNumber) -> Self {
        match number.get() {
            1..=10 => Self::Band0,
            11..=20 => Self::Band1,
            21..=30 => Self::Band2,
            31..=40 => Self::Band3,
            _ => Self::Band4,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Band0 => 0,
            Self::Band1 => 1,
            Self::Band2 => 2,
            Self::Band3 => 3,
            Self::Band4 => 4,
        }
    }

    /// Style class used by surfaces that render with CSS-like themes.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Band0 => "color-0",
            Self::Band1 => "color-1",
            Self::Band2 => "color-2",
            Self::Band3 => "color-3",
            Self::Band4 => "color-4",
        }
    }
}

/// Six distinct balls in the order they are revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Draw {
    numbers: Vec<BallNumber>,
}

impl Draw {
    pub fn from_numbers(values: &[u8]) -> Result<Self, DrawError> {
        if values.len() != DRAW_SIZE {
            return Err(DrawError::WrongCount {
                expected: DRAW_SIZE,
                actual: values.len(),
            });
        }

        let mut numbers: Vec<BallNumber> = Vec::with_capacity(DRAW_SIZE);
        for &value in values {
            let number = BallNumber::new(value)?;
            if numbers.contains(&number) {
                return Err(DrawError::Duplicate { value });
            }
            numbers.push(number);
        }

        Ok(Self { numbers })
    }

    pub(crate) fn from_validated(numbers: Vec<BallNumber>) -> Self {
        debug_assert_eq!(numbers.len(), DRAW_SIZE);
        Self { numbers }
    }

    pub fn reveal_order(&self) -> &[BallNumber] {
        &self.numbers
    }

    pub fn display_order(&self) -> Vec<BallNumber> {
        let mut sorted = self.numbers.clone();
        sorted.sort_unstable();
        sorted
    }

    pub fn contains(&self, number: BallNumber) -> bool {
        self.numbers.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

impl TryFrom<Vec<u8>> for Draw {
    type Error = DrawError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_numbers(&value)
    }
}

impl From<Draw> for Vec<u8> {
    fn from(value: Draw) -> Self {
        value.numbers.into_iter().map(u8::from).collect()
    }
}

/// Collects distinct draw numbers in a fixed capacity pool until it holds
/// [`DRAW_SIZE`] of them. Used by samplers that pick one candidate at a time.
#[derive(Debug, Default)]
pub struct DrawBuilder {
    numbers: Vec<BallNumber>,
}

impl DrawBuilder {
    /// Returns `false` when the number was already chosen or the draw is full.
    pub fn offer(&mut self, number: BallNumber) -> bool {
        if self.is_complete() || self.numbers.contains(&number) {
            return false;
        }
        self.numbers.push(number);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.numbers.len() == DRAW_SIZE
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn finish(self) -> Result<Draw, DrawError> {
        if !self.is_complete() {
            return Err(DrawError::WrongCount {
                expected: DRAW_SIZE,
                actual: self.numbers.len(),
            });
        }
        Ok(Draw::from_validated(self.numbers))
    }
}

/// Balls already revealed in the current draw, kept in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedSet {
    sorted: Vec<BallNumber>,
}

impl RevealedSet {
    /// Inserts in sorted position. Returns `false` if the ball was already revealed.
    pub fn insert(&mut self, number: BallNumber) -> bool {
        match self.sorted.binary_search(&number) {
            Ok(_) => false,
            Err(position) => {
                self.sorted.insert(position, number);
                true
            }
        }
    }

    pub fn as_slice(&self) -> &[BallNumber] {
        &self.sorted
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn clear(&mut self) {
        self.sorted.clear();
    }

    pub fn is_subset_of(&self, draw: &Draw) -> bool {
        self.sorted.iter().all(|number| draw.contains(*number))
    }

    pub fn covers(&self, draw: &Draw) -> bool {
        self.len() == draw.len() && self.is_subset_of(draw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    #[default]
    Idle,
    Drawing,
    Announcing,
    Done,
}

impl SequencerState {
    /// Whether `next` is a legal transition. Any state may fall back to `Idle`
    /// because a restart forcibly resets the sequence.
    pub fn can_advance_to(self, next: SequencerState) -> bool {
        matches!(
            (self, next),
            (_, SequencerState::Idle)
                | (SequencerState::Idle, SequencerState::Drawing)
                | (SequencerState::Drawing, SequencerState::Announcing)
                | (SequencerState::Announcing, SequencerState::Done)
        )
    }

    pub fn is_running(self) -> bool {
        matches!(self, SequencerState::Drawing | SequencerState::Announcing)
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SequencerState::Idle => "idle",
            SequencerState::Drawing => "drawing",
            SequencerState::Announcing => "announcing",
            SequencerState::Done => "done",
        };
        f.write_str(label)
    }
}
