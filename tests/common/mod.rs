#![allow(dead_code)]

/// Assembles a document from encoded objects using one-byte references.
pub fn bplist(objects: &[&[u8]], root: usize) -> Vec<u8> {
    bplist_with_reference_size(objects, root, 1)
}

/// Assembles a document from encoded objects. Object references inside the
/// encoded objects must already be `reference_size` bytes wide.
pub fn bplist_with_reference_size(objects: &[&[u8]], root: usize, reference_size: u8) -> Vec<u8> {
    let mut document = b"bplist00".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for object in objects {
        offsets.push(document.len());
        document.extend_from_slice(object);
    }

    let offset_table_offset = document.len();
    let offset_size: u8 = if offset_table_offset <= 0xFF { 1 } else { 2 };
    for offset in offsets {
        match offset_size {
            1 => document.push(offset as u8),
            _ => document.extend_from_slice(&(offset as u16).to_be_bytes()),
        }
    }

    document.extend_from_slice(&[0; 6]);
    document.push(offset_size);
    document.push(reference_size);
    for field in &[objects.len(), root, offset_table_offset] {
        document.extend_from_slice(&[0; 4]);
        document.extend_from_slice(&(*field as u32).to_be_bytes());
    }
    document
}

/// Encodes an ASCII string object.
pub fn ascii(text: &str) -> Vec<u8> {
    assert!(text.len() < 15);
    let mut object = vec![0x50 | text.len() as u8];
    object.extend_from_slice(text.as_bytes());
    object
}

/// Installs a subscriber printing decoder logs, filtered by `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
