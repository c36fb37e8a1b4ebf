//! Minimal NumPy `.npy` (format 1.0) reader and writer.
//!
//! Only what the scanner exchanges is supported: little-endian `f4`/`f8`
//! arrays in C order.

use std::io::{self, Read, Write};

use ndarray::Array3;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

/// Scalar types that can be written to an `.npy` file.
pub trait NpyElement: Copy {
    const DESCR: &'static str;

    fn write_le<W: Write + ?Sized>(self, out: &mut W) -> io::Result<()>;
}

impl NpyElement for f32 {
    const DESCR: &'static str = "<f4";

    fn write_le<W: Write + ?Sized>(self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.to_le_bytes())
    }
}

impl NpyElement for f64 {
    const DESCR: &'static str = "<f8";

    fn write_le<W: Write + ?Sized>(self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.to_le_bytes())
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({single},)"),
        _ => {
            let dims: Vec<String> = shape.iter().map(ToString::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Writes `values` (C order) as an array of `shape`.
pub fn write_array<W, T, I>(out: &mut W, shape: &[usize], values: I) -> io::Result<()>
where
    W: Write + ?Sized,
    T: NpyElement,
    I: IntoIterator<Item = T>,
{
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        T::DESCR,
        shape_literal(shape)
    );
    // magic + version + u16 length + header + '\n' must be a multiple of 64
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let header_len = u16::try_from(header.len()).map_err(|_| invalid("npy header too long"))?;
    out.write_all(MAGIC)?;
    out.write_all(&[1, 0])?;
    out.write_all(&header_len.to_le_bytes())?;
    out.write_all(header.as_bytes())?;

    let expected: usize = shape.iter().product();
    let mut written = 0usize;
    for value in values {
        value.write_le(out)?;
        written += 1;
    }
    if written != expected {
        return Err(invalid(format!(
            "shape {:?} needs {} values, got {}",
            shape, expected, written
        )));
    }
    Ok(())
}

struct Header {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

fn dict_value<'a>(header: &'a str, key: &str) -> io::Result<&'a str> {
    let needle = format!("'{key}':");
    let start = header
        .find(&needle)
        .ok_or_else(|| invalid(format!("npy header has no '{key}'")))?;
    Ok(header[start + needle.len()..].trim_start())
}

fn parse_header(text: &str) -> io::Result<Header> {
    let descr_rest = dict_value(text, "descr")?;
    let descr = descr_rest
        .strip_prefix('\'')
        .and_then(|rest| rest.split('\'').next())
        .ok_or_else(|| invalid("malformed descr"))?
        .to_string();

    let fortran_order = dict_value(text, "fortran_order")?.starts_with("True");

    let shape_rest = dict_value(text, "shape")?;
    let inner = shape_rest
        .strip_prefix('(')
        .and_then(|rest| rest.split(')').next())
        .ok_or_else(|| invalid("malformed shape"))?;
    let shape = inner
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| dim.parse::<usize>().map_err(|e| invalid(format!("bad dimension '{dim}': {e}"))))
        .collect::<io::Result<Vec<_>>>()?;

    Ok(Header {
        descr,
        fortran_order,
        shape,
    })
}

/// Reads a three-dimensional `f4` or `f8` array, converting to `f32`.
pub fn read_array3<R: Read>(input: &mut R) -> io::Result<Array3<f32>> {
    let mut magic = [0u8; 6];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(invalid("not an npy file"));
    }

    let mut version = [0u8; 2];
    input.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            input.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            input.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        major => return Err(invalid(format!("unsupported npy version {major}"))),
    };

    let mut header_bytes = vec![0u8; header_len];
    input.read_exact(&mut header_bytes)?;
    let text = String::from_utf8(header_bytes).map_err(|e| invalid(e.to_string()))?;
    let header = parse_header(&text)?;

    if header.fortran_order {
        return Err(invalid("fortran-ordered arrays are not supported"));
    }
    let [d0, d1, d2] = header.shape[..] else {
        return Err(invalid(format!("expected a 3-D array, got shape {:?}", header.shape)));
    };

    let width = match header.descr.as_str() {
        "<f4" => 4,
        "<f8" => 8,
        other => return Err(invalid(format!("unsupported dtype '{other}'"))),
    };
    let byte_len = d0
        .checked_mul(d1)
        .and_then(|n| n.checked_mul(d2))
        .and_then(|n| n.checked_mul(width))
        .ok_or_else(|| invalid(format!("shape {:?} is too large", header.shape)))?;

    // sized by the bytes present, not by the header
    let mut bytes = Vec::new();
    input.take(byte_len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != byte_len {
        return Err(invalid(format!(
            "shape {:?} needs {} data bytes, found {}",
            header.shape,
            byte_len,
            bytes.len()
        )));
    }

    let values: Vec<f32> = if width == 4 {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    } else {
        bytes
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()
    };

    Array3::from_shape_vec((d0, d1, d2), values).map_err(|e| invalid(e.to_string()))
}
