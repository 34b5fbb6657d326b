//! String-table recovery from undocumented binary containers.
//!
//! Effect files keep their texture and sub-effect names as length-prefixed
//! UTF-16 records, but the records are interleaved with numeric payloads we
//! do not model. Instead of parsing the format we run several independent
//! heuristics over the same buffer and union what they find:
//!
//! 1. [`length_prefixed_utf16`]: walks the buffer after the 4-byte header,
//!    reading a u32 LE code-unit count followed by UTF-16LE data.
//! 2. [`unaligned_utf16`]: retries the same test at every even offset, in
//!    both byte orders, recovering records the first pass desynchronized on.
//! 3. [`ascii_runs`]: plain runs of printable ASCII.
//!
//! [`length_prefixed_bytes`] is an additional pass for formats that store
//! byte strings (UTF-8 or ASCII) behind the same kind of length prefix.
//!
//! Every heuristic is a pure function of the buffer and never fails:
//! a length or decode that does not work out simply moves the cursor on.

use serde::Serialize;
use std::collections::HashMap;

/// Bytes skipped before the first length-prefixed record.
pub const HEADER_LEN: usize = 4;

/// Exclusive upper bound on a record length (code units or bytes).
pub const MAX_RECORD_LEN: u32 = 1000;

/// Minimum length of an ASCII run worth keeping.
const MIN_ASCII_RUN: usize = 4;

/// Candidates of this many characters or fewer are dropped.
const MIN_CANDIDATE_CHARS: usize = 3;

/// Which heuristic produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    LengthPrefixed,
    UnalignedPrefixed,
    AsciiRun,
    ByteString,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::LengthPrefixed => "length-prefixed",
            ExtractionMethod::UnalignedPrefixed => "unaligned",
            ExtractionMethod::AsciiRun => "ascii-run",
            ExtractionMethod::ByteString => "byte-string",
        }
    }
}

/// A readable string recovered from a buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringCandidate {
    /// Offset of the length prefix (or first byte for runs)
    pub offset: usize,
    /// Declared length for prefixed records, observed length for runs
    pub length: usize,
    pub text: String,
    pub method: ExtractionMethod,
}

/// Run all three string heuristics and merge the results.
///
/// Output is offset-ascending and free of duplicate texts; when the same
/// text is seen more than once the lowest offset is kept. All heuristics
/// feed one [`CandidateSet`], so memory follows the number of distinct
/// texts rather than the number of hits.
pub fn scan(buffer: &[u8]) -> Vec<StringCandidate> {
    let mut set = CandidateSet::new();
    length_prefixed_utf16_into(buffer, &mut set);
    unaligned_utf16_into(buffer, &mut set);
    ascii_runs_into(buffer, &mut set);
    set.into_sorted()
}

/// Sort by offset and drop short and duplicate candidates.
pub fn merge(candidates: Vec<StringCandidate>) -> Vec<StringCandidate> {
    let mut set = CandidateSet::new();
    for candidate in candidates {
        set.insert(candidate);
    }
    set.into_sorted()
}

/// Distinct candidate texts, each with its earliest sighting.
///
/// A text seen again at a lower `(offset, method)` replaces the stored
/// entry; anything of [`MIN_CANDIDATE_CHARS`] characters or fewer is never
/// stored.
#[derive(Debug, Default)]
pub struct CandidateSet {
    by_text: HashMap<String, StringCandidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }

    pub fn insert(&mut self, candidate: StringCandidate) {
        if candidate.text.chars().count() < MIN_CANDIDATE_CHARS {
            return;
        }
        match self.by_text.get_mut(&candidate.text) {
            Some(existing) => {
                if (candidate.offset, candidate.method) < (existing.offset, existing.method) {
                    *existing = candidate;
                }
            }
            None => {
                self.by_text.insert(candidate.text.clone(), candidate);
            }
        }
    }

    /// Offset-ascending, ties broken by method.
    pub fn into_sorted(self) -> Vec<StringCandidate> {
        let mut out: Vec<_> = self.by_text.into_values().collect();
        out.sort_by(|a, b| a.offset.cmp(&b.offset).then(a.method.cmp(&b.method)));
        out
    }
}

/// Heuristic 1: sequential length-prefixed UTF-16LE records.
pub fn length_prefixed_utf16(buffer: &[u8]) -> Vec<StringCandidate> {
    let mut set = CandidateSet::new();
    length_prefixed_utf16_into(buffer, &mut set);
    set.into_sorted()
}

fn length_prefixed_utf16_into(buffer: &[u8], set: &mut CandidateSet) {
    let mut pos = HEADER_LEN;

    while pos + 4 <= buffer.len() {
        if let Some(units) = read_len(buffer, pos) {
            let start = pos + 4;
            let end = start + units * 2;
            if end <= buffer.len() {
                if let Some(text) = decode_utf16(&buffer[start..end], Endian::Little) {
                    set.insert(StringCandidate {
                        offset: pos,
                        length: units,
                        text,
                        method: ExtractionMethod::LengthPrefixed,
                    });
                    pos = end;
                    continue;
                }
            }
        }
        pos += 1;
    }
}

/// Heuristic 2: the same length test at every even offset, both byte orders.
///
/// Numeric payloads such as index buffers decode as readable text at almost
/// every offset, so hits are deduplicated as they are found.
pub fn unaligned_utf16(buffer: &[u8]) -> Vec<StringCandidate> {
    let mut set = CandidateSet::new();
    unaligned_utf16_into(buffer, &mut set);
    set.into_sorted()
}

fn unaligned_utf16_into(buffer: &[u8], set: &mut CandidateSet) {
    let mut pos = 0;

    while pos + 4 <= buffer.len() {
        if let Some(units) = read_len(buffer, pos) {
            let start = pos + 4;
            let end = start + units * 2;
            if end <= buffer.len() {
                let data = &buffer[start..end];
                // Both byte orders usually decode; keep each readable reading
                for endian in [Endian::Little, Endian::Big] {
                    let Some(text) = decode_utf16(data, endian) else {
                        continue;
                    };
                    if text.chars().any(is_printable) {
                        set.insert(StringCandidate {
                            offset: pos,
                            length: units,
                            text,
                            method: ExtractionMethod::UnalignedPrefixed,
                        });
                    }
                }
            }
        }
        pos += 2;
    }
}

/// Heuristic 3: runs of printable ASCII longer than three bytes.
pub fn ascii_runs(buffer: &[u8]) -> Vec<StringCandidate> {
    let mut set = CandidateSet::new();
    ascii_runs_into(buffer, &mut set);
    set.into_sorted()
}

fn ascii_runs_into(buffer: &[u8], set: &mut CandidateSet) {
    let mut run_start: Option<usize> = None;

    for (i, &byte) in buffer.iter().enumerate() {
        if is_printable_ascii(byte) {
            if run_start.is_none() {
                run_start = Some(i);
            }
        } else if let Some(start) = run_start.take() {
            push_run(set, buffer, start, i);
        }
    }
    if let Some(start) = run_start {
        push_run(set, buffer, start, buffer.len());
    }
}

fn push_run(set: &mut CandidateSet, buffer: &[u8], start: usize, end: usize) {
    if end - start < MIN_ASCII_RUN {
        return;
    }
    // Printable ASCII is always valid UTF-8
    let text = String::from_utf8_lossy(&buffer[start..end]).into_owned();
    set.insert(StringCandidate {
        offset: start,
        length: end - start,
        text,
        method: ExtractionMethod::AsciiRun,
    });
}

/// Length-prefixed byte strings: a u32 LE byte count followed by text in
/// UTF-8, UTF-16LE or ASCII (first that decodes to something printable).
/// A single trailing NUL terminator is stripped. Repeated texts keep their
/// first offset.
pub fn length_prefixed_bytes(buffer: &[u8], start_at: usize) -> Vec<StringCandidate> {
    let mut set = CandidateSet::new();
    let mut pos = start_at;

    while pos + 4 <= buffer.len() {
        if let Some(len) = read_len(buffer, pos) {
            let start = pos + 4;
            let end = start + len;
            if end <= buffer.len() {
                let mut data = &buffer[start..end];
                if let Some((&0, rest)) = data.split_last() {
                    data = rest;
                }
                if let Some(text) = decode_byte_string(data) {
                    set.insert(StringCandidate {
                        offset: pos,
                        length: len,
                        text,
                        method: ExtractionMethod::ByteString,
                    });
                }
            }
        }
        pos += 1;
    }

    set.into_sorted()
}

fn decode_byte_string(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    let utf8 = std::str::from_utf8(data).ok().map(str::to_string);
    let utf16 = || decode_utf16(data, Endian::Little);
    let ascii = || {
        data.is_ascii()
            .then(|| String::from_utf8_lossy(data).into_owned())
    };

    utf8.into_iter()
        .chain(utf16())
        .chain(ascii())
        .find(|text| text.chars().any(is_printable))
}

/// Read a u32 LE length at `pos` and accept it only inside `(0, MAX_RECORD_LEN)`.
fn read_len(buffer: &[u8], pos: usize) -> Option<usize> {
    let bytes: [u8; 4] = buffer.get(pos..pos + 4)?.try_into().ok()?;
    let len = u32::from_le_bytes(bytes);
    (len > 0 && len < MAX_RECORD_LEN).then_some(len as usize)
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Endian {
    Little,
    Big,
}

/// Strict UTF-16 decode; `None` on odd length or unpaired surrogates.
pub(crate) fn decode_utf16(data: &[u8], endian: Endian) -> Option<String> {
    if data.len() % 2 != 0 {
        return None;
    }
    let units = data.chunks_exact(2).map(|pair| match endian {
        Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
        Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
    });
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Lossy UTF-16 decode that drops unpaired surrogates and a trailing odd byte.
pub(crate) fn decode_utf16_lossy(data: &[u8], endian: Endian) -> String {
    let units = data.chunks_exact(2).map(|pair| match endian {
        Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
        Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
    });
    char::decode_utf16(units).filter_map(Result::ok).collect()
}

/// Printable in the sense of "renders as a visible glyph or a space".
pub fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}

fn is_printable_ascii(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}
