use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatType {
    Seater,
    Sleeper,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deck {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatPosition {
    Window,
    Aisle,
    Middle,
}

/// One seat on a bus. Immutable after creation; `price_modifier_minor` is
/// added to the schedule's base price and may be negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub seat_number: String,
    pub seat_type: SeatType,
    pub deck: Deck,
    pub row: i16,
    pub column: i16,
    pub position: SeatPosition,
    pub price_modifier_minor: i64,
    pub female_only: bool,
}

impl fmt::Display for SeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeatType::Seater => "SEATER",
            SeatType::Sleeper => "SLEEPER",
        })
    }
}

impl FromStr for SeatType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEATER" => Ok(SeatType::Seater),
            "SLEEPER" => Ok(SeatType::Sleeper),
            other => Err(ParseError::new("seat type", other)),
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Deck::Lower => "LOWER",
            Deck::Upper => "UPPER",
        })
    }
}

impl FromStr for Deck {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOWER" => Ok(Deck::Lower),
            "UPPER" => Ok(Deck::Upper),
            other => Err(ParseError::new("deck", other)),
        }
    }
}

impl fmt::Display for SeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeatPosition::Window => "WINDOW",
            SeatPosition::Aisle => "AISLE",
            SeatPosition::Middle => "MIDDLE",
        })
    }
}

impl FromStr for SeatPosition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WINDOW" => Ok(SeatPosition::Window),
            "AISLE" => Ok(SeatPosition::Aisle),
            "MIDDLE" => Ok(SeatPosition::Middle),
            other => Err(ParseError::new("seat position", other)),
        }
    }
}
