// Copyright 2026 The Aura Sentinel Authors.
// This file is part of aura-sentinel.

// aura-sentinel is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// aura-sentinel is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with aura-sentinel.  If not, see <http://www.gnu.org/licenses/>.

use ethereum_types::{Address, U256};
use keccak_hash::keccak;
use rlp::{Rlp, RlpStream};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, Secp256k1,
};

use crate::error::CodecError;
use crate::header::Header;
use crate::raw::RawBlock;

const EMPTY_SIGNATURE: [u8; 65] = [0u8; 65];
const EMPTY_ADDRESS: Address = Address::zero();

fn u256_to_u64(value: U256, field: &str) -> Result<u64, CodecError> {
    if value > U256::from(u64::MAX) {
        return Err(CodecError::MalformedHeader(format!(
            "{} does not fit in a u64",
            field
        )));
    }
    Ok(value.low_u64())
}

/// Copy a wire block into canonical byte form. Hex decoding of `author` and
/// `signature` has already happened at deserialization time (see
/// [`crate::raw`]); this only validates lengths and numeric ranges.
pub fn canonicalize(raw: &RawBlock) -> Result<Header, CodecError> {
    if raw.signature.len() != 65 {
        return Err(CodecError::MalformedHeader(format!(
            "signature must be 65 bytes, found {}",
            raw.signature.len()
        )));
    }
    let mut signature = [0u8; 65];
    signature.copy_from_slice(&raw.signature);

    Ok(Header {
        parent_hash: raw.parent_hash,
        uncles_hash: raw.sha3_uncles,
        author: raw.author,
        state_root: raw.state_root,
        transactions_root: raw.transactions_root,
        receipts_root: raw.receipts_root,
        logs_bloom: raw.logs_bloom,
        difficulty: raw.difficulty,
        number: u256_to_u64(raw.number, "number")?,
        gas_limit: raw.gas_limit,
        gas_used: raw.gas_used,
        timestamp: u256_to_u64(raw.timestamp, "timestamp")?,
        extra_data: raw.extra_data.clone(),
        seal_fields: raw.seal_fields.clone(),
        signature,
        hash: raw.hash,
    })
}

/// Keccak-256 of the RLP-encoded 13-field list excluding the Aura seal and
/// signature. Requires exactly two seal fields.
pub fn bare_hash(header: &Header) -> Result<ethereum_types::H256, CodecError> {
    if header.seal_fields.len() != 2 {
        return Err(CodecError::UnsupportedSeal(header.seal_fields.len()));
    }

    let mut stream = RlpStream::new_list(13);
    stream
        .append(&header.parent_hash)
        .append(&header.uncles_hash)
        .append(&header.author)
        .append(&header.state_root)
        .append(&header.transactions_root)
        .append(&header.receipts_root)
        .append(&header.logs_bloom)
        .append(&header.difficulty)
        .append(&header.number)
        .append(&header.gas_limit)
        .append(&header.gas_used)
        .append(&header.timestamp)
        .append(&header.extra_data);

    Ok(keccak(stream.out()))
}

/// Recover the signer of a header's bare hash, or the zero address for an
/// unsigned (all-zero signature) block such as genesis.
pub fn recover_proposer(header: &Header) -> Result<Address, CodecError> {
    if header.signature == EMPTY_SIGNATURE {
        return Ok(EMPTY_ADDRESS);
    }

    let message_hash = bare_hash(header)?;
    let message = Message::from_slice(message_hash.as_bytes())
        .map_err(|e| CodecError::BadSignature(e.to_string()))?;

    let recovery_byte = header.signature[64];
    let recovery_id = RecoveryId::from_i32(recovery_byte as i32)
        .map_err(|e| CodecError::BadSignature(e.to_string()))?;
    let recoverable = RecoverableSignature::from_compact(&header.signature[..64], recovery_id)
        .map_err(|e| CodecError::BadSignature(e.to_string()))?;

    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| CodecError::BadSignature(e.to_string()))?;

    Ok(public_to_address(&public_key))
}

fn public_to_address(public_key: &secp256k1::PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    // Skip the leading 0x04 tag byte; the address is the last 20 bytes of
    // the hash of the 64-byte (x, y) encoding.
    let hash = keccak(&uncompressed[1..]);
    Address::from_slice(&hash.as_bytes()[12..])
}

/// Decode the Aura step from the header's first seal field. The field holds
/// an RLP-encoded byte string which different clients populate either with
/// the step's decimal ASCII digits or with its big-endian bytes; both are
/// accepted, anything that doesn't fit a u64 is refused.
pub fn decode_step(header: &Header) -> Result<u64, CodecError> {
    let raw_seal_field = header
        .seal_fields
        .first()
        .ok_or_else(|| CodecError::MalformedHeader("missing step seal field".to_string()))?;

    let inner: Vec<u8> = Rlp::new(raw_seal_field)
        .as_val()
        .map_err(|e| CodecError::MalformedHeader(format!("step seal field: {}", e)))?;

    if inner.is_empty() {
        return Ok(0);
    }

    if inner.iter().all(|b| b.is_ascii_digit()) {
        if let Ok(s) = std::str::from_utf8(&inner) {
            if let Ok(v) = s.parse::<u64>() {
                return check_fits_i64(v);
            }
        }
    }

    if inner.len() > 8 {
        return Err(CodecError::StepOverflow);
    }
    let mut buf = [0u8; 8];
    buf[8 - inner.len()..].copy_from_slice(&inner);
    check_fits_i64(u64::from_be_bytes(buf))
}

/// Numbers above 2^63 are refused, not just ones that don't fit in a u64.
fn check_fits_i64(v: u64) -> Result<u64, CodecError> {
    if v > i64::MAX as u64 {
        return Err(CodecError::StepOverflow);
    }
    Ok(v)
}
