//! Flat array blob codec shared by all persistent backends.
//!
//! Layout: `ENSB` magic, format version, dtype tag, rank, one padding byte,
//! `rank` little-endian u64 extents, then the little-endian payload.

use ensemble_core::errors::StorageError;
use ensemble_core::types::{GridShape, NormalityField, VoxelMask};

const MAGIC: &[u8; 4] = b"ENSB";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 8;

/// Element type tag stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DType {
    /// u64 member indices.
    Index = 1,
    /// One byte per voxel, 0 or 1.
    Bool = 2,
    /// f32 p-values.
    F32 = 3,
}

impl DType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(DType::Index),
            2 => Some(DType::Bool),
            3 => Some(DType::F32),
            _ => None,
        }
    }

    fn width(self) -> usize {
        match self {
            DType::Index => 8,
            DType::Bool => 1,
            DType::F32 => 4,
        }
    }
}

fn encoding_error(message: impl Into<String>) -> StorageError {
    StorageError::Encoding {
        message: message.into(),
    }
}

fn write_header(dtype: DType, dims: &[usize], payload_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + dims.len() * 8 + payload_len);
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    out.push(dtype as u8);
    out.push(dims.len() as u8);
    out.push(0);
    for &d in dims {
        out.extend_from_slice(&(d as u64).to_le_bytes());
    }
    out
}

/// Validate the header and return the extents and the payload.
fn read_header(bytes: &[u8], expected: DType) -> Result<(Vec<usize>, &[u8]), StorageError> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(encoding_error("missing ENSB magic"));
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(encoding_error(format!("unsupported format version {}", bytes[4])));
    }
    let dtype = DType::from_tag(bytes[5])
        .ok_or_else(|| encoding_error(format!("unknown dtype tag {}", bytes[5])))?;
    if dtype != expected {
        return Err(encoding_error(format!("expected {expected:?} blob, found {dtype:?}")));
    }
    let rank = bytes[6] as usize;
    let dims_end = HEADER_LEN + rank * 8;
    if bytes.len() < dims_end {
        return Err(encoding_error("truncated extents"));
    }
    let mut dims = Vec::with_capacity(rank);
    for chunk in bytes[HEADER_LEN..dims_end].chunks_exact(8) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        let extent = usize::try_from(u64::from_le_bytes(raw))
            .map_err(|_| encoding_error("extent does not fit in usize"))?;
        dims.push(extent);
    }
    let required = dims
        .iter()
        .try_fold(dtype.width(), |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| encoding_error("extent product overflows"))?;
    let payload = &bytes[dims_end..];
    if payload.len() != required {
        return Err(encoding_error(format!(
            "payload holds {} bytes, extents require {required}",
            payload.len()
        )));
    }
    Ok((dims, payload))
}

fn grid_from_dims(dims: &[usize]) -> Result<GridShape, StorageError> {
    match *dims {
        [x, y, z] => GridShape::new([x, y, z]).map_err(|e| encoding_error(e.to_string())),
        _ => Err(encoding_error(format!("expected rank 3 grid, found rank {}", dims.len()))),
    }
}

pub fn encode_indices(indices: &[usize]) -> Vec<u8> {
    let mut out = write_header(DType::Index, &[indices.len()], indices.len() * 8);
    for &i in indices {
        out.extend_from_slice(&(i as u64).to_le_bytes());
    }
    out
}

pub fn decode_indices(bytes: &[u8]) -> Result<Vec<usize>, StorageError> {
    let (dims, payload) = read_header(bytes, DType::Index)?;
    if dims.len() != 1 {
        return Err(encoding_error("index blob must have rank 1"));
    }
    payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            usize::try_from(u64::from_le_bytes(raw))
                .map_err(|_| encoding_error("member index does not fit in usize"))
        })
        .collect()
}

pub fn encode_mask(mask: &VoxelMask) -> Vec<u8> {
    let bits = mask.bits();
    let mut out = write_header(DType::Bool, &mask.shape().dims(), bits.len());
    out.extend(bits.iter().map(|&b| u8::from(b)));
    out
}

pub fn decode_mask(bytes: &[u8]) -> Result<VoxelMask, StorageError> {
    let (dims, payload) = read_header(bytes, DType::Bool)?;
    let shape = grid_from_dims(&dims)?;
    let bits = payload
        .iter()
        .map(|&b| match b {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(encoding_error(format!("invalid boolean byte {other}"))),
        })
        .collect::<Result<Vec<bool>, _>>()?;
    VoxelMask::from_bits(shape, bits).map_err(|e| encoding_error(e.to_string()))
}

pub fn encode_field(field: &NormalityField) -> Vec<u8> {
    let values = field.p_values();
    let mut out = write_header(DType::F32, &field.shape().dims(), values.len() * 4);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn decode_field(bytes: &[u8]) -> Result<NormalityField, StorageError> {
    let (dims, payload) = read_header(bytes, DType::F32)?;
    let shape = grid_from_dims(&dims)?;
    let values = payload
        .chunks_exact(4)
        .map(|chunk| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(chunk);
            f32::from_le_bytes(raw)
        })
        .collect();
    NormalityField::from_values(shape, values).map_err(|e| encoding_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> GridShape {
        GridShape::new([2, 3, 1]).unwrap()
    }

    #[test]
    fn indices_survive_encoding() {
        let indices = vec![0, 5, 17, 3];
        assert_eq!(decode_indices(&encode_indices(&indices)).unwrap(), indices);
        assert!(decode_indices(&encode_indices(&[])).unwrap().is_empty());
    }

    #[test]
    fn mask_keeps_its_grid() {
        let mask = VoxelMask::from_bits(shape(), vec![true, false, true, true, false, false]).unwrap();
        let decoded = decode_mask(&encode_mask(&mask)).unwrap();
        assert_eq!(decoded, mask);
        assert_eq!(decoded.shape().dims(), [2, 3, 1]);
    }

    #[test]
    fn field_keeps_exact_bits() {
        let field =
            NormalityField::from_values(shape(), vec![1.0, 0.0, 0.049_999, 1e-30, 0.5, 0.25]).unwrap();
        assert_eq!(decode_field(&encode_field(&field)).unwrap(), field);
    }

    #[test]
    fn wrong_dtype_is_rejected() {
        let blob = encode_indices(&[1, 2]);
        assert!(matches!(decode_mask(&blob), Err(StorageError::Encoding { .. })));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut blob = encode_indices(&[1, 2, 3]);
        blob.pop();
        assert!(decode_indices(&blob).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_field(b"not a blob").is_err());
        assert!(decode_field(&[]).is_err());
    }

    #[test]
    fn invalid_boolean_byte_is_rejected() {
        let mask = VoxelMask::full(shape());
        let mut blob = encode_mask(&mask);
        let last = blob.len() - 1;
        blob[last] = 7;
        assert!(decode_mask(&blob).is_err());
    }
}
