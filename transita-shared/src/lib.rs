pub mod events;
pub mod money;
pub mod pii;

pub use money::percentage_of_minor;
pub use pii::Masked;
