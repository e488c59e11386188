//! Array wire images.
//!
//! Binary layout of an array value, in order:
//! - dimension count (4 bytes, signed)
//! - data offset (4 bytes, present but unused)
//! - element type OID (4 bytes)
//! - per dimension: size (4 bytes, signed) and lower bound (4 bytes, unused)
//! - per element: length (4 bytes, signed, `-1` for NULL), then that many
//!   payload bytes
//!
//! Only one-dimensional arrays are supported. A dimension count of 0, or a
//! single dimension of size 0, is an empty array and carries no element
//! bytes. Element payloads decode through [`FromWire`], so a NULL element
//! lands in `Option` element types exactly like a NULL cell would, and the
//! elements after it still decode. Bytes past the last declared element
//! belong to the outer framing and are left unread.

use bytes::Buf;

use crate::error::{DecodeError, DecodeResult};
use crate::protocol::types::{Oid, TypeRegistry};
use crate::protocol::value::{FromWire, WireValue};

/// Element length denoting a NULL element.
const NULL_LENGTH: i32 = -1;

/// Cursor over an array image; every read checks the remaining length.
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn get_i32(&mut self) -> DecodeResult<i32> {
        if self.buf.remaining() < 4 {
            return Err(DecodeError::Truncated {
                needed: 4,
                available: self.buf.remaining(),
            });
        }
        Ok(self.buf.get_i32())
    }

    fn get_u32(&mut self) -> DecodeResult<u32> {
        if self.buf.remaining() < 4 {
            return Err(DecodeError::Truncated {
                needed: 4,
                available: self.buf.remaining(),
            });
        }
        Ok(self.buf.get_u32())
    }

    fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if self.buf.len() < len {
            return Err(DecodeError::Truncated {
                needed: len,
                available: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }
}

/// Parsed array header: declared element count plus the element cursor.
struct ArrayImage<'a> {
    len: usize,
    elem_oid: Oid,
    body: Cursor<'a>,
}

fn read_image<'a>(
    bytes: &'a [u8],
    expected_elem_oid: Oid,
    target: &'static str,
) -> DecodeResult<ArrayImage<'a>> {
    let mut cursor = Cursor::new(bytes);
    let ndim = cursor.get_i32()?;
    cursor.get_i32()?; // data offset, present but unused
    let elem_oid = cursor.get_u32()?;
    if elem_oid != expected_elem_oid {
        return Err(DecodeError::TypeMismatch {
            expected: expected_elem_oid,
            actual: elem_oid,
            target,
        });
    }
    let len = match ndim {
        0 => 0,
        1 => {
            let size = cursor.get_i32()?;
            cursor.get_i32()?; // lower bound, unused
            if size < 0 {
                return Err(DecodeError::MalformedArray("negative dimension size"));
            }
            size as usize
        }
        _ => return Err(DecodeError::RankUnsupported(ndim)),
    };
    Ok(ArrayImage {
        len,
        elem_oid,
        body: cursor,
    })
}

impl<'a> ArrayImage<'a> {
    /// Decode the declared elements in order.
    fn read_elements<T: FromWire<'a>>(mut self, registry: &TypeRegistry) -> DecodeResult<Vec<T>> {
        // Every element carries at least its 4-byte length prefix, which
        // bounds the allocation for a declared count the payload cannot hold.
        let mut elements = Vec::with_capacity(self.len.min(self.body.remaining() / 4));
        for _ in 0..self.len {
            let len = self.body.get_i32()?;
            let cell = match len {
                NULL_LENGTH => WireValue::null(self.elem_oid),
                len if len < 0 => {
                    return Err(DecodeError::MalformedArray("element length below -1"));
                }
                len => WireValue::new(self.elem_oid, Some(self.body.take(len as usize)?)),
            };
            elements.push(cell.decode(registry)?);
        }
        Ok(elements)
    }
}

/// Growable destination: accepts whatever element count the image declares.
impl<'a, T: FromWire<'a>> FromWire<'a> for Vec<T> {
    fn expected_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
        T::expected_array_oid(registry)
    }

    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        let bytes = value.expect_var(Self::expected_oid(registry)?, "array")?;
        read_image(bytes, T::expected_oid(registry)?, "array element")?.read_elements(registry)
    }
}

/// Fixed-capacity destination: the declared element count must equal `N`
/// exactly, checked before any element is decoded.
impl<'a, T: FromWire<'a>, const N: usize> FromWire<'a> for [T; N] {
    fn expected_oid(registry: &TypeRegistry) -> DecodeResult<Oid> {
        T::expected_array_oid(registry)
    }

    fn from_wire(value: WireValue<'a>, registry: &TypeRegistry) -> DecodeResult<Self> {
        let bytes = value.expect_var(Self::expected_oid(registry)?, "array")?;
        let image = read_image(bytes, T::expected_oid(registry)?, "array element")?;
        if image.len != N {
            return Err(DecodeError::CapacityMismatch {
                expected: N,
                actual: image.len,
            });
        }
        image
            .read_elements(registry)?
            .try_into()
            .map_err(|elements: Vec<T>| DecodeError::CapacityMismatch {
                expected: N,
                actual: elements.len(),
            })
    }
}
