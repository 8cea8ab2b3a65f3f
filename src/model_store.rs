//! Word-vector and document-vector model persistence.
//!
//! Word models are a text header followed by `word SP <vector bytes> LF`
//! records; loading RMS-normalizes every vector. Document models are a raw
//! native-endian binary layout and are loaded back byte-for-byte unchanged.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::mmap::WriteMap;

pub fn save_word_model(path: impl AsRef<Path>, map: &HashMap<String, Vec<f32>>, dim: u16) -> Result<()> {
    let path = path.as_ref();
    let mut out = std::io::BufWriter::new(
        std::fs::File::create(path).map_err(|e| Error::io(path, e))?,
    );
    write!(out, "{} {}\n", map.len(), dim).map_err(|e| Error::io(path, e))?;
    for (word, vector) in map {
        out.write_all(word.as_bytes()).map_err(|e| Error::io(path, e))?;
        out.write_all(b" ").map_err(|e| Error::io(path, e))?;
        for &x in vector {
            out.write_f32::<LittleEndian>(x).map_err(|e| Error::io(path, e))?;
        }
        out.write_all(b"\n").map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

pub fn load_word_model(path: impl AsRef<Path>) -> Result<(HashMap<String, Vec<f32>>, u16)> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    if len == 0 {
        return Err(Error::EmptyFile { path: path.to_path_buf() });
    }
    let mut reader = BufReader::new(file);

    let mut header = String::new();
    reader
        .read_line(&mut header)
        .map_err(|e| Error::io(path, e))?;
    let mut parts = header.trim_end().split_whitespace();
    let count: usize = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::malformed("missing or invalid word count in header"))?;
    let dim: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::malformed("missing or invalid vector size in header"))?;

    let mut map = HashMap::with_capacity(count);
    for _ in 0..count {
        let mut word_bytes = Vec::new();
        reader
            .read_until(b' ', &mut word_bytes)
            .map_err(|e| Error::io(path, e))?;
        if word_bytes.last() == Some(&b' ') {
            word_bytes.pop();
        }
        if word_bytes.is_empty() {
            return Err(Error::malformed("truncated word record"));
        }
        let word = String::from_utf8(word_bytes).map_err(|_| Error::malformed("word is not valid UTF-8"))?;

        let mut vector = Vec::with_capacity(dim as usize);
        for _ in 0..dim {
            let v = reader
                .read_f32::<LittleEndian>()
                .map_err(|_| Error::malformed("truncated vector"))?;
            vector.push(v);
        }
        // consume the trailing newline
        let mut nl = [0u8; 1];
        reader.read_exact(&mut nl).map_err(|_| Error::malformed("missing record terminator"))?;

        let mut sum_sq = 0f32;
        for &x in &vector {
            sum_sq += x * x;
        }
        if sum_sq <= 0.0 {
            return Err(Error::malformed("failed to normalize vector: zero magnitude"));
        }
        let rms = (sum_sq / dim as f32).sqrt();
        for x in vector.iter_mut() {
            *x /= rms;
        }

        map.insert(word, vector);
    }

    Ok((map, dim))
}

/// Writes the doc model in one pass: the file size is known exactly ahead of
/// time (fixed-size header + fixed-size records), so it is mapped and filled
/// directly rather than streamed through a buffered writer.
pub fn save_doc_model(path: impl AsRef<Path>, map: &HashMap<u64, Vec<f32>>, dim: u16) -> Result<()> {
    let path = path.as_ref();
    let record_size = 8 + dim as usize * 4;
    let size = 16 + record_size * map.len();

    let mut mapped = WriteMap::create(path, size as u64)?;
    let mut out = std::io::Cursor::new(mapped.data_mut());
    out.write_u64::<NativeEndian>(map.len() as u64)
        .map_err(|e| Error::io(path, e))?;
    out.write_u64::<NativeEndian>(dim as u64)
        .map_err(|e| Error::io(path, e))?;
    for (&id, vector) in map {
        out.write_u64::<NativeEndian>(id).map_err(|e| Error::io(path, e))?;
        for &x in vector {
            out.write_f32::<NativeEndian>(x).map_err(|e| Error::io(path, e))?;
        }
    }
    mapped.flush()?;
    Ok(())
}

pub fn load_doc_model(path: impl AsRef<Path>) -> Result<(HashMap<u64, Vec<f32>>, u16)> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    if data.len() < 16 {
        return Err(Error::malformed("doc model header truncated"));
    }
    let mut cursor = std::io::Cursor::new(&data);
    let count = cursor.read_u64::<NativeEndian>().map_err(|_| Error::malformed("bad header"))? as usize;
    let dim = cursor.read_u64::<NativeEndian>().map_err(|_| Error::malformed("bad header"))? as u16;

    let record_size = 8 + dim as usize * 4;
    let expected = 16 + record_size * count;
    if data.len() != expected {
        return Err(Error::malformed("doc model file size does not match header"));
    }

    let mut map = HashMap::with_capacity(count);
    for _ in 0..count {
        let id = cursor.read_u64::<NativeEndian>().map_err(|_| Error::malformed("truncated record"))?;
        let mut vector = Vec::with_capacity(dim as usize);
        for _ in 0..dim {
            vector.push(cursor.read_f32::<NativeEndian>().map_err(|_| Error::malformed("truncated record"))?);
        }
        map.insert(id, vector);
    }

    Ok((map, dim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_model_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut map = HashMap::new();
        map.insert("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        map.insert("b".to_string(), vec![0.5, 0.5, 0.5, 0.5]);
        save_word_model(&path, &map, 4).unwrap();
        let (loaded, dim) = load_word_model(&path).unwrap();
        assert_eq!(dim, 4);
        assert_eq!(loaded.len(), 2);
        for v in loaded.values() {
            let rms = (v.iter().map(|x| x * x).sum::<f32>() / 4.0).sqrt();
            assert!((rms - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn truncated_word_model_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut map = HashMap::new();
        map.insert("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        save_word_model(&path, &map, 4).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.pop();
        std::fs::write(&path, bytes).unwrap();
        assert!(load_word_model(&path).is_err());
    }

    #[test]
    fn doc_model_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.bin");
        let mut map = HashMap::new();
        map.insert(1u64, vec![1.0, 0.0]);
        map.insert(2u64, vec![0.0, 1.0]);
        save_doc_model(&path, &map, 2).unwrap();
        let (loaded, dim) = load_doc_model(&path).unwrap();
        assert_eq!(dim, 2);
        assert_eq!(loaded, map);
    }

    #[test]
    fn doc_model_size_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.bin");
        let mut map = HashMap::new();
        map.insert(1u64, vec![1.0, 0.0]);
        save_doc_model(&path, &map, 2).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.push(0);
        std::fs::write(&path, bytes).unwrap();
        assert!(load_doc_model(&path).is_err());
    }
}
