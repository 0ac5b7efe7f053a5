use qtatom::atoms::FourCC;
use qtatom::reader::{AtomReader, ParseError};

fn atom(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

fn extended_atom(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(&((16 + payload.len()) as u64).to_be_bytes());
    v.extend_from_slice(payload);
    v
}

#[test]
fn walks_siblings_without_gaps() {
    let mut data = atom(b"ftyp", b"isom\x00\x00\x02\x00isom");
    data.extend_from_slice(&atom(b"free", &[0xAA; 4]));

    let mut reader = AtomReader::new(&data);

    let first = reader.next().expect("first atom");
    assert_eq!(first.typ, FourCC(*b"ftyp"));
    assert_eq!(first.size, 20);
    assert_eq!(first.data.len(), 12);
    assert_eq!(first.data.read_to_vec().unwrap(), b"isom\x00\x00\x02\x00isom");

    let second = reader.next().expect("second atom");
    assert_eq!(second.typ, FourCC(*b"free"));
    assert_eq!(second.size, 12);
    assert_eq!(second.data.read_to_vec().unwrap(), vec![0xAA; 4]);

    assert!(reader.next().is_none());
    assert!(reader.error().is_none());
}

#[test]
fn empty_source_is_clean_end() {
    let data: Vec<u8> = Vec::new();
    let mut reader = AtomReader::new(&data);
    assert!(reader.next().is_none());
    assert!(reader.error().is_none());
}

#[test]
fn extended_size_payload_starts_at_16() {
    let data = extended_atom(b"mdat", &[1, 2, 3, 4, 5]);
    let mut reader = AtomReader::new(&data);

    let a = reader.next().expect("atom");
    assert_eq!(a.typ, FourCC(*b"mdat"));
    assert_eq!(a.size, 21);
    assert_eq!(a.data.len(), 5);
    assert_eq!(a.data.read_to_vec().unwrap(), vec![1, 2, 3, 4, 5]);

    assert!(reader.next().is_none());
    assert!(reader.error().is_none());
}

#[test]
fn partial_header_is_terminal_error() {
    let mut data = atom(b"free", &[0; 2]);
    data.extend_from_slice(&[0, 0, 0, 9]); // 4 stray bytes

    let mut reader = AtomReader::new(&data);
    assert!(reader.next().is_some());
    assert!(reader.next().is_none());
    assert!(matches!(
        reader.error(),
        Some(ParseError::TruncatedHeader {
            offset: 10,
            got: 4,
            want: 8
        })
    ));

    // Error is latched; further calls stay at end.
    assert!(reader.next().is_none());
    assert!(reader.error().is_some());
}

#[test]
fn truncated_extended_size_is_terminal_error() {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[0, 0, 0]); // only 3 of 8 extended-size bytes

    let mut reader = AtomReader::new(&data);
    assert!(reader.next().is_none());
    assert!(matches!(
        reader.error(),
        Some(ParseError::TruncatedHeader {
            offset: 8,
            got: 3,
            want: 8
        })
    ));
}

#[test]
fn rejects_sizes_smaller_than_header() {
    for bad in [0u32, 5] {
        let mut data = Vec::new();
        data.extend_from_slice(&bad.to_be_bytes());
        data.extend_from_slice(b"free");

        let mut reader = AtomReader::new(&data);
        assert!(reader.next().is_none());
        assert!(matches!(
            reader.error(),
            Some(ParseError::InvalidSize { offset: 0, .. })
        ));
    }

    // Extended form needs at least 16 bytes total.
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&10u64.to_be_bytes());
    let mut reader = AtomReader::new(&data);
    assert!(reader.next().is_none());
    assert!(matches!(
        reader.error(),
        Some(ParseError::InvalidSize { offset: 0, size: 10 })
    ));
}

#[test]
fn nested_atoms_parse_through_payload_view() {
    let mdhd = atom(b"mdhd", &[0; 24]);
    let mut moov_payload = mdhd.clone();
    moov_payload.extend_from_slice(&atom(b"free", &[]));
    let data = atom(b"moov", &moov_payload);

    let mut reader = AtomReader::new(&data);
    let moov = reader.next().expect("moov");
    assert_eq!(moov.typ, FourCC(*b"moov"));

    let mut inner = AtomReader::new(&moov.data);
    let child = inner.next().expect("mdhd");
    assert_eq!(child.typ, FourCC(*b"mdhd"));
    assert_eq!(child.size, 32);
    assert_eq!(child.data.read_to_vec().unwrap(), vec![0; 24]);

    let tail = inner.next().expect("free");
    assert_eq!(tail.typ, FourCC(*b"free"));
    assert_eq!(tail.size, 8);
    assert!(tail.data.is_empty());

    assert!(inner.next().is_none());
    assert!(inner.error().is_none());
    assert!(reader.next().is_none());
}

#[test]
fn payload_view_reads_incrementally() {
    use std::io::Read;

    let data = atom(b"free", b"abcdefgh");
    let mut reader = AtomReader::new(&data);
    let mut view = reader.next().expect("atom").data;

    let mut half = [0u8; 4];
    view.read_exact(&mut half).unwrap();
    assert_eq!(&half, b"abcd");

    let mut rest = Vec::new();
    view.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"efgh");
}

#[test]
fn overlong_declared_size_leaves_payload_unreadable() {
    // A complete header whose declared size runs past the end of the source:
    // the atom is still produced lazily, but draining its view fails and the
    // subsequent read lands past EOF, which is a clean end.
    let mut data = Vec::new();
    data.extend_from_slice(&100u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[7; 10]);

    let mut reader = AtomReader::new(&data);
    let a = reader.next().expect("atom");
    assert_eq!(a.size, 100);
    assert_eq!(a.data.len(), 92);
    let err = a.data.read_to_vec().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);

    assert!(reader.next().is_none());
    assert!(reader.error().is_none());
}
