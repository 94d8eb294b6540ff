//! Length-prefixed binary codec for dumping and reloading caches.
//!
//! A dump is a flat concatenation of entries with no header, version tag or
//! checksum:
//!
//! ```text
//! entry := key_chunk value_chunk
//! chunk := length (u64, little-endian, 8 bytes) payload (length bytes)
//! ```
//!
//! Entries are written from the least recently used to the most recently
//! used, so replaying them through [`Cache::set`](crate::Cache::set)
//! rebuilds the original recency order.
//!
//! Payloads come from the [`ByteCodec`] implementation of the key and value
//! types. Integral scalars encode to their little-endian bytes, sequences of
//! integral elements encode element by element, and callers implement the
//! trait for their own composite types.
//!
//! Decoding reads either a borrowed slice, handing out zero-copy views of
//! each payload ([`SliceSource`]), or a single-pass byte stream, pulling one
//! byte at a time into a scratch buffer ([`StreamSource`]).

use std::collections::VecDeque;
use std::io::{self, Read};
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;

use crate::error::{CodecError, Result};

/// Width of a chunk length prefix in bytes.
pub const LEN_PREFIX: usize = size_of::<u64>();

/// Serializer/deserializer pair for one chunk payload.
///
/// # Examples
///
/// A composite type encoded as two integral fields:
///
/// ```
/// use lrumem_core::{ByteCodec, Cache, CodecError};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl ByteCodec for Point {
///     fn encode(&self, out: &mut Vec<u8>) {
///         self.x.encode(out);
///         self.y.encode(out);
///     }
///
///     fn decode(chunk: &[u8]) -> Result<Self, CodecError> {
///         if chunk.len() != 8 {
///             return Err(CodecError::InvalidLength {
///                 type_name: "Point",
///                 expected: 8,
///                 actual: chunk.len(),
///             });
///         }
///         Ok(Point {
///             x: i32::decode(&chunk[..4])?,
///             y: i32::decode(&chunk[4..])?,
///         })
///     }
/// }
///
/// let mut cache: Cache<u8, Point> = Cache::new();
/// cache.set(1, Point { x: 3, y: -4 });
///
/// let mut restored: Cache<u8, Point> = Cache::new();
/// restored.load(&cache.dump()).unwrap();
/// assert_eq!(restored, cache);
/// ```
pub trait ByteCodec: Sized {
    /// Appends the payload bytes of `self` to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Rebuilds a value from exactly one payload.
    fn decode(chunk: &[u8]) -> Result<Self>;
}

/// Fixed-width scalar usable as a sequence element.
pub trait Integral: ByteCodec + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;
}

macro_rules! integral_codec {
    ($($ty:ty),* $(,)?) => {$(
        impl ByteCodec for $ty {
            #[inline]
            fn encode(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn decode(chunk: &[u8]) -> Result<Self> {
                let bytes = <[u8; size_of::<$ty>()]>::try_from(chunk).map_err(|_| {
                    CodecError::InvalidLength {
                        type_name: stringify!($ty),
                        expected: size_of::<$ty>(),
                        actual: chunk.len(),
                    }
                })?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }

        impl Integral for $ty {
            const WIDTH: usize = size_of::<$ty>();
        }
    )*};
}

integral_codec!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl ByteCodec for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        match u8::decode(chunk).map_err(|_| CodecError::InvalidLength {
            type_name: "bool",
            expected: 1,
            actual: chunk.len(),
        })? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidPayload(format!(
                "{other} is not a valid bool"
            ))),
        }
    }
}

impl Integral for bool {
    const WIDTH: usize = 1;
}

impl ByteCodec for char {
    fn encode(&self, out: &mut Vec<u8>) {
        u32::from(*self).encode(out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        let scalar = u32::decode(chunk).map_err(|_| CodecError::InvalidLength {
            type_name: "char",
            expected: 4,
            actual: chunk.len(),
        })?;
        char::from_u32(scalar).ok_or_else(|| {
            CodecError::InvalidPayload(format!("{scalar:#x} is not a Unicode scalar value"))
        })
    }
}

impl Integral for char {
    const WIDTH: usize = 4;
}

fn encode_elements<'a, T: Integral + 'a>(items: impl IntoIterator<Item = &'a T>, out: &mut Vec<u8>) {
    for item in items {
        item.encode(out);
    }
}

fn decode_elements<'a, T: Integral + 'a>(
    chunk: &'a [u8],
) -> Result<impl Iterator<Item = Result<T>> + 'a> {
    if chunk.len() % T::WIDTH != 0 {
        return Err(CodecError::Misaligned {
            type_name: std::any::type_name::<T>(),
            width: T::WIDTH,
            actual: chunk.len(),
        });
    }
    Ok(chunk.chunks_exact(T::WIDTH).map(T::decode))
}

impl<T: Integral> ByteCodec for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.len() * T::WIDTH);
        encode_elements(self, out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        decode_elements(chunk)?.collect()
    }
}

impl<T: Integral> ByteCodec for VecDeque<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.len() * T::WIDTH);
        encode_elements(self, out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        decode_elements(chunk)?.collect()
    }
}

impl<T: Integral> ByteCodec for Box<[T]> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_elements(self.iter(), out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        Vec::<T>::decode(chunk).map(Vec::into_boxed_slice)
    }
}

impl<T: Integral, const N: usize> ByteCodec for [T; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_elements(self, out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        let items = Vec::<T>::decode(chunk)?;
        <[T; N]>::try_from(items).map_err(|_| CodecError::InvalidLength {
            type_name: std::any::type_name::<Self>(),
            expected: N * T::WIDTH,
            actual: chunk.len(),
        })
    }
}

impl ByteCodec for String {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        Ok(std::str::from_utf8(chunk)?.to_owned())
    }
}

impl<T: ByteCodec> ByteCodec for Box<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        (**self).encode(out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        T::decode(chunk).map(Box::new)
    }
}

impl<T: ByteCodec> ByteCodec for Arc<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        (**self).encode(out);
    }

    fn decode(chunk: &[u8]) -> Result<Self> {
        T::decode(chunk).map(Arc::new)
    }
}

/// Appends one length-prefixed chunk holding the payload of `item`.
///
/// The prefix is reserved first and backfilled once the payload length is
/// known, so the payload is encoded straight into `out`.
pub fn write_chunk<T: ByteCodec>(out: &mut Vec<u8>, item: &T) {
    let start = out.len();
    out.extend_from_slice(&[0u8; LEN_PREFIX]);
    item.encode(out);
    let len = (out.len() - start - LEN_PREFIX) as u64;
    out[start..start + LEN_PREFIX].copy_from_slice(&len.to_le_bytes());
}

/// Appends one encoded entry (key chunk then value chunk).
pub fn write_entry<K: ByteCodec, V: ByteCodec>(out: &mut Vec<u8>, key: &K, value: &V) {
    write_chunk(out, key);
    write_chunk(out, value);
}

/// A source of length-prefixed chunks.
///
/// `Ok(None)` means the input ended cleanly on a chunk boundary.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>>;
}

/// Chunks read from a borrowed buffer; payloads are zero-copy subslices.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl<'a> ChunkSource for SliceSource<'a> {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.bytes.is_empty() {
            return Ok(None);
        }
        if self.bytes.len() < LEN_PREFIX {
            return Err(CodecError::TruncatedHeader {
                available: self.bytes.len(),
            });
        }
        let (prefix, rest) = self.bytes.split_at(LEN_PREFIX);
        let mut raw = [0u8; LEN_PREFIX];
        raw.copy_from_slice(prefix);
        let declared = u64::from_le_bytes(raw);

        // Checked before slicing: a bogus prefix never reads past the buffer.
        let len = usize::try_from(declared)
            .ok()
            .filter(|&len| len <= rest.len())
            .ok_or(CodecError::TruncatedChunk {
                declared,
                available: rest.len(),
            })?;
        let (payload, tail) = rest.split_at(len);
        self.bytes = tail;
        Ok(Some(payload))
    }
}

/// Chunks pulled one byte at a time from a single-pass byte stream.
///
/// The scratch buffer grows only as bytes actually arrive, so a corrupt
/// length prefix cannot trigger a large up-front allocation.
#[derive(Debug)]
pub struct StreamSource<I> {
    bytes: I,
    scratch: Vec<u8>,
}

impl<I> StreamSource<I>
where
    I: Iterator<Item = io::Result<u8>>,
{
    pub fn new(bytes: I) -> Self {
        Self {
            bytes,
            scratch: Vec::new(),
        }
    }
}

impl<I> ChunkSource for StreamSource<I>
where
    I: Iterator<Item = io::Result<u8>>,
{
    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        let mut raw = [0u8; LEN_PREFIX];
        for (filled, slot) in raw.iter_mut().enumerate() {
            match self.bytes.next() {
                Some(byte) => *slot = byte?,
                None if filled == 0 => return Ok(None),
                None => return Err(CodecError::TruncatedHeader { available: filled }),
            }
        }
        let declared = u64::from_le_bytes(raw);

        self.scratch.clear();
        let mut remaining = declared;
        while remaining > 0 {
            match self.bytes.next() {
                Some(byte) => self.scratch.push(byte?),
                None => {
                    return Err(CodecError::TruncatedChunk {
                        declared,
                        available: self.scratch.len(),
                    })
                }
            }
            remaining -= 1;
        }
        Ok(Some(&self.scratch))
    }
}

/// Adapts an infallible byte iterator to the stream source's item type.
#[derive(Debug, Clone)]
pub struct InfallibleBytes<I>(I);

impl<I: Iterator<Item = u8>> Iterator for InfallibleBytes<I> {
    type Item = io::Result<u8>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// Iterator decoding `(key, value)` pairs from a chunk source.
///
/// Yields `Err` once on the first malformed chunk and then stops.
///
/// # Examples
///
/// ```
/// use lrumem_core::{Cache, Decoder};
///
/// let mut cache: Cache<u16, String> = Cache::new();
/// cache.set(1, "one".to_string());
/// cache.set(2, "two".to_string());
/// let bytes = cache.dump();
///
/// // Least recently used first.
/// let pairs: Vec<(u16, String)> = Decoder::from_slice(&bytes)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(pairs, vec![(1, "one".to_string()), (2, "two".to_string())]);
/// ```
pub struct Decoder<K, V, Src> {
    source: Src,
    finished: bool,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, Src> Decoder<K, V, Src> {
    pub fn new(source: Src) -> Self {
        Self {
            source,
            finished: false,
            _marker: PhantomData,
        }
    }
}

impl<'a, K, V> Decoder<K, V, SliceSource<'a>> {
    /// Decodes from a borrowed buffer without copying payloads.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::new(SliceSource::new(bytes))
    }
}

impl<K, V, R: Read> Decoder<K, V, StreamSource<io::Bytes<R>>> {
    /// Decodes from a reader, one byte at a time.
    ///
    /// Wrap unbuffered readers such as files in a `BufReader`.
    pub fn from_reader(reader: R) -> Self {
        Self::new(StreamSource::new(reader.bytes()))
    }
}

impl<K, V, I: Iterator<Item = u8>> Decoder<K, V, StreamSource<InfallibleBytes<I>>> {
    /// Decodes from any single-pass iterator of bytes.
    pub fn from_bytes<T>(bytes: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self::new(StreamSource::new(InfallibleBytes(bytes.into_iter())))
    }
}

impl<K, V, Src> Decoder<K, V, Src>
where
    K: ByteCodec,
    V: ByteCodec,
    Src: ChunkSource,
{
    fn next_entry(&mut self) -> Result<Option<(K, V)>> {
        let key = match self.source.next_chunk()? {
            Some(chunk) => K::decode(chunk)?,
            None => return Ok(None),
        };
        let value = match self.source.next_chunk()? {
            Some(chunk) => V::decode(chunk)?,
            None => return Err(CodecError::MissingValue),
        };
        Ok(Some((key, value)))
    }
}

impl<K, V, Src> Iterator for Decoder<K, V, Src>
where
    K: ByteCodec,
    V: ByteCodec,
    Src: ChunkSource,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<K, V, Src> std::iter::FusedIterator for Decoder<K, V, Src>
where
    K: ByteCodec,
    V: ByteCodec,
    Src: ChunkSource,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: ByteCodec>(item: &T) -> Vec<u8> {
        let mut out = Vec::new();
        item.encode(&mut out);
        out
    }

    #[test]
    fn test_integral_payloads_are_little_endian() {
        assert_eq!(encoded(&0x0102u16), vec![0x02, 0x01]);
        assert_eq!(encoded(&-1i32), vec![0xff; 4]);
        assert_eq!(encoded(&7u8), vec![7]);
    }

    #[test]
    fn test_integral_wrong_width() {
        let err = u32::decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidLength {
                type_name: "u32",
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_bool_and_char() {
        assert_eq!(bool::decode(&encoded(&true)).unwrap(), true);
        assert!(matches!(bool::decode(&[2]), Err(CodecError::InvalidPayload(_))));
        assert_eq!(char::decode(&encoded(&'ж')).unwrap(), 'ж');
        assert!(matches!(
            char::decode(&0xD800u32.to_le_bytes()),
            Err(CodecError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_sequences() {
        let v = vec![1u16, 2, 3];
        assert_eq!(encoded(&v), vec![1, 0, 2, 0, 3, 0]);
        assert_eq!(Vec::<u16>::decode(&encoded(&v)).unwrap(), v);

        let d: VecDeque<i8> = VecDeque::from(vec![-1, 0, 1]);
        assert_eq!(VecDeque::<i8>::decode(&encoded(&d)).unwrap(), d);

        let b: Box<[u32]> = vec![7, 8].into_boxed_slice();
        assert_eq!(Box::<[u32]>::decode(&encoded(&b)).unwrap(), b);

        let a = [9u8, 8, 7];
        assert_eq!(<[u8; 3]>::decode(&encoded(&a)).unwrap(), a);
    }

    #[test]
    fn test_sequence_misaligned() {
        let err = Vec::<u32>::decode(&[0; 6]).unwrap_err();
        assert!(matches!(err, CodecError::Misaligned { width: 4, actual: 6, .. }));
    }

    #[test]
    fn test_array_wrong_count() {
        let err = <[u8; 3]>::decode(&[1, 2]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidLength { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_string_utf8() {
        assert_eq!(String::decode("héllo".as_bytes()).unwrap(), "héllo");
        assert!(matches!(String::decode(&[0xc3]), Err(CodecError::Utf8(_))));
    }

    #[test]
    fn test_write_chunk_prefix() {
        let mut out = Vec::new();
        write_chunk(&mut out, &"abc".to_string());
        assert_eq!(&out[..LEN_PREFIX], &3u64.to_le_bytes());
        assert_eq!(&out[LEN_PREFIX..], b"abc");

        write_chunk(&mut out, &String::new());
        assert_eq!(out.len(), 2 * LEN_PREFIX + 3);
        assert_eq!(&out[LEN_PREFIX + 3..], &0u64.to_le_bytes());
    }

    #[test]
    fn test_slice_source_is_zero_copy() {
        let mut out = Vec::new();
        write_chunk(&mut out, &vec![5u8, 6, 7]);
        let mut source = SliceSource::new(&out);
        let chunk = source.next_chunk().unwrap().unwrap();
        assert_eq!(chunk, &[5, 6, 7]);
        assert!(std::ptr::eq(chunk.as_ptr(), out[LEN_PREFIX..].as_ptr()));
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_slice_source_declared_length_too_large() {
        let mut bytes = 100u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"short");
        let mut source = SliceSource::new(&bytes);
        let err = source.next_chunk().unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedChunk {
                declared: 100,
                available: 5
            }
        ));
    }

    #[test]
    fn test_slice_source_huge_length() {
        let bytes = u64::MAX.to_le_bytes();
        let err = SliceSource::new(&bytes).next_chunk().unwrap_err();
        assert!(matches!(err, CodecError::TruncatedChunk { .. }));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = [1u8, 0, 0];
        let err = SliceSource::new(&bytes).next_chunk().unwrap_err();
        assert!(matches!(err, CodecError::TruncatedHeader { available: 3 }));

        let mut stream = StreamSource::new(InfallibleBytes(bytes.into_iter()));
        let err = stream.next_chunk().unwrap_err();
        assert!(matches!(err, CodecError::TruncatedHeader { available: 3 }));
    }

    #[test]
    fn test_stream_source_reads_chunks() {
        let mut out = Vec::new();
        write_entry(&mut out, &1u32, &"one".to_string());
        let mut stream = StreamSource::new(InfallibleBytes(out.into_iter()));
        assert_eq!(stream.next_chunk().unwrap(), Some(&1u32.to_le_bytes()[..]));
        assert_eq!(stream.next_chunk().unwrap(), Some(&b"one"[..]));
        assert_eq!(stream.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_stream_source_huge_length_fails_without_allocating() {
        let bytes = u64::MAX.to_le_bytes();
        let mut stream = StreamSource::new(InfallibleBytes(bytes.into_iter()));
        let err = stream.next_chunk().unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedChunk {
                declared: u64::MAX,
                available: 0
            }
        ));
        assert_eq!(stream.scratch.capacity(), 0);
    }

    #[test]
    fn test_stream_source_propagates_io_errors() {
        let bytes = vec![
            Ok(1u8),
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire")),
        ];
        let mut stream = StreamSource::new(bytes.into_iter());
        assert!(matches!(stream.next_chunk(), Err(CodecError::Io(_))));
    }

    #[test]
    fn test_decoder_missing_value() {
        let mut out = Vec::new();
        write_chunk(&mut out, &1u8);
        let mut decoder = Decoder::<u8, u8, _>::from_slice(&out);
        assert!(matches!(decoder.next(), Some(Err(CodecError::MissingValue))));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_decoder_stops_after_fault() {
        let mut out = Vec::new();
        write_entry(&mut out, &1u8, &2u8);
        write_entry(&mut out, &3u16, &4u8);
        write_entry(&mut out, &5u8, &6u8);
        let items: Vec<_> = Decoder::<u8, u8, _>::from_slice(&out).collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok((1, 2))));
        assert!(matches!(items[1], Err(CodecError::InvalidLength { .. })));
    }

    #[test]
    fn test_decoder_sources_agree() {
        let mut out = Vec::new();
        write_entry(&mut out, &"a".to_string(), &vec![1u64, 2]);
        write_entry(&mut out, &"b".to_string(), &Vec::<u64>::new());

        let from_slice: Vec<(String, Vec<u64>)> = Decoder::from_slice(&out)
            .collect::<Result<_>>()
            .unwrap();
        let from_reader: Vec<(String, Vec<u64>)> = Decoder::from_reader(&out[..])
            .collect::<Result<_>>()
            .unwrap();
        let from_bytes: Vec<(String, Vec<u64>)> = Decoder::from_bytes(out.iter().copied())
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(from_slice, from_reader);
        assert_eq!(from_slice, from_bytes);
        assert_eq!(from_slice[1], ("b".to_string(), vec![]));
    }
}
