// lumen/core/storage/src/db/keys.rs

// Key layouts; all integers big-endian so keys sort numerically
use lumen_primitives::{Address, AssetId};

pub const ADDRESS_LEN: usize = 20;

pub fn contract_key(address: &Address) -> Vec<u8> {
    address.as_bytes().to_vec()
}

/// address ++ slot
pub fn storage_key(address: &Address, slot: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_LEN + slot.len());
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(slot.as_bytes());
    key
}

/// Slot name of a [`storage_key`]
pub fn slot_of(key: &[u8]) -> anyhow::Result<String> {
    if key.len() < ADDRESS_LEN {
        anyhow::bail!("storage key too short: {}", hex::encode(key));
    }
    Ok(String::from_utf8(key[ADDRESS_LEN..].to_vec())?)
}

/// address ++ slot length ++ slot; no slot prefix can collide with another slot
pub fn change_prefix(address: &Address, slot: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_LEN + 4 + slot.len() + 8);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(&(slot.len() as u32).to_be_bytes());
    key.extend_from_slice(slot.as_bytes());
    key
}

pub fn change_key(address: &Address, slot: &str, seq: u64) -> Vec<u8> {
    let mut key = change_prefix(address, slot);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

pub fn encode_seq(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

pub fn decode_seq(bytes: &[u8]) -> anyhow::Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("invalid change sequence: {}", hex::encode(bytes)))?;
    Ok(u64::from_be_bytes(raw))
}

pub fn balance_key(address: &Address, asset_id: AssetId) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_LEN + 8);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(&asset_id.0.to_be_bytes());
    key
}

pub fn encode_amount(amount: i64) -> [u8; 8] {
    amount.to_be_bytes()
}

pub fn decode_amount(bytes: &[u8]) -> anyhow::Result<i64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("invalid balance encoding: {}", hex::encode(bytes)))?;
    Ok(i64::from_be_bytes(raw))
}
