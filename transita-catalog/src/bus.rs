use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical coach. Owns its seat definitions; the seat layout is fixed for
/// the life of the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: Uuid,
    pub operator_name: String,
    pub registration_number: String,
    pub layout_name: String,
}

impl Bus {
    pub fn new(operator_name: &str, registration_number: &str, layout_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            operator_name: operator_name.to_string(),
            registration_number: registration_number.to_string(),
            layout_name: layout_name.to_string(),
        }
    }
}
