use interleave_core::UnitNode;

/// Parses a raw representation into its structural form.
pub fn decode(bytes: &[u8]) -> Result<UnitNode, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Inverse of [`decode`].
pub fn encode(unit: &UnitNode) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(unit)
}
