//! Sentence-aware streaming text chunker.
//!
//! Splits line-oriented text into [`Chunk`]s of roughly `max_chars`
//! Unicode code points. Short lines are merged; once the running buffer
//! reaches the threshold, the chunk is closed at the next sentence-terminal
//! character (`? ! 。 ？ ！`). Text is never cut inside a sentence: a long
//! line with no terminal punctuation becomes one oversized chunk. When every
//! line is shorter than `max_chars`, chunks stay under `3 * max_chars`.
//!
//! # Algorithm
//!
//! For every physical line, with a buffer `cache` carried across lines:
//!
//! 1. Trim the line and skip it if empty.
//! 2. Replace quote characters (`' " “ ” ‘ ’ 「 」 『 』`) with spaces and
//!    append `\n`.
//! 3. If `cache + line` stays below `max_chars`, append and continue.
//! 4. If the line has no terminal punctuation, append it and flush.
//! 5. Otherwise scan the line: jump straight to the position where the
//!    buffer would reach `max_chars`, then walk forward and flush after
//!    every terminal character. The unconsumed tail stays in `cache`.
//! 6. Flush whatever remains at end of input.
//!
//! # Example
//!
//! ```rust
//! use ragline_core::chunk::Chunker;
//!
//! let chunks = Chunker::new(5).chunk_str("abcdef? ghi");
//! let texts: Vec<&str> = chunks.iter().map(|c| c.as_str()).collect();
//! assert_eq!(texts, ["abcdef?", "ghi"]);
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead};

use crate::models::Chunk;

/// Default chunk length threshold in Unicode code points.
pub const DEFAULT_MAX_CHARS: usize = 384;

const TERMINALS: [char; 5] = ['?', '!', '。', '？', '！'];

const QUOTES: [char; 10] = ['\'', '"', '“', '”', '‘', '’', '「', '」', '『', '』'];

fn is_terminal(c: char) -> bool {
    TERMINALS.contains(&c)
}

/// Splits text into sentence-respecting chunks.
///
/// A `Chunker` holds only configuration; every call to [`chunks`](Chunker::chunks)
/// or [`chunk_str`](Chunker::chunk_str) starts from an empty buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl Chunker {
    /// Create a chunker with the given threshold (clamped to at least 1).
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Stream chunks from a line-oriented reader.
    ///
    /// Lines are pulled lazily; read errors (including invalid UTF-8) are
    /// yielded once and end the stream.
    pub fn chunks<R: BufRead>(&self, reader: R) -> ChunkStream<R> {
        ChunkStream {
            lines: reader.lines(),
            segmenter: Segmenter::new(self.max_chars),
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// Chunk an in-memory string.
    pub fn chunk_str(&self, text: &str) -> Vec<Chunk> {
        let mut segmenter = Segmenter::new(self.max_chars);
        let mut out = VecDeque::new();
        for line in text.lines() {
            segmenter.push_line(line, &mut out);
        }
        segmenter.finish(&mut out);
        out.into()
    }
}

/// Iterator returned by [`Chunker::chunks`].
pub struct ChunkStream<R> {
    lines: io::Lines<R>,
    segmenter: Segmenter,
    ready: VecDeque<Chunk>,
    done: bool,
}

impl<R: BufRead> Iterator for ChunkStream<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(Ok(chunk));
            }
            if self.done {
                return None;
            }
            match self.lines.next() {
                Some(Ok(line)) => self.segmenter.push_line(&line, &mut self.ready),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    self.segmenter.finish(&mut self.ready);
                }
            }
        }
    }
}

/// Cross-line buffer state. `cache_len` tracks code points, not bytes.
struct Segmenter {
    max_chars: usize,
    cache: String,
    cache_len: usize,
}

impl Segmenter {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            cache: String::new(),
            cache_len: 0,
        }
    }

    fn push_line(&mut self, raw: &str, out: &mut VecDeque<Chunk>) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }

        let mut line: Vec<char> = trimmed
            .chars()
            .map(|c| if QUOTES.contains(&c) { ' ' } else { c })
            .collect();
        line.push('\n');
        let n = line.len();

        if self.cache_len + n < self.max_chars {
            self.append(&line);
            return;
        }

        if !line.iter().copied().any(is_terminal) {
            self.append(&line);
            self.flush(out);
            return;
        }

        // `i` is a 1-based cursor: `line[i - 1]` is the character under test.
        let mut s = 0usize;
        let mut i = 1usize;
        while i <= n {
            if self.cache_len + (i - s) < self.max_chars {
                i = (self.max_chars - self.cache_len) + s;
                if i > n {
                    break;
                }
                self.append(&line[s..i]);
                s = i;
            }
            if is_terminal(line[i - 1]) {
                self.append(&line[s..i]);
                s = i;
                self.flush(out);
            }
            i += 1;
        }

        if n > s {
            self.append(&line[s..]);
        }
    }

    fn finish(&mut self, out: &mut VecDeque<Chunk>) {
        self.flush(out);
    }

    fn append(&mut self, chars: &[char]) {
        self.cache.extend(chars);
        self.cache_len += chars.len();
    }

    fn flush(&mut self, out: &mut VecDeque<Chunk>) {
        let text = self.cache.trim();
        if !text.is_empty() {
            out.push_back(Chunk::new(text));
        }
        self.cache.clear();
        self.cache_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(Chunker::default().chunk_str("").is_empty());
        assert!(Chunker::default().chunk_str("\n   \n\t\n").is_empty());
    }

    #[test]
    fn test_short_lines_merge_into_one_chunk() {
        let chunks = Chunker::default().chunk_str("Hello?\n\nWorld\n  again  ");
        assert_eq!(texts(&chunks), ["Hello?\nWorld\nagain"]);
    }

    #[test]
    fn test_oversized_line_without_terminal_is_not_split() {
        let line = "a".repeat(500);
        let chunks = Chunker::new(384).chunk_str(&line);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].char_len(), 500);
    }

    #[test]
    fn test_fallback_flushes_buffered_lines_too() {
        let chunks = Chunker::new(10).chunk_str("abc\ndefghijkl\nmn");
        assert_eq!(texts(&chunks), ["abc\ndefghijkl", "mn"]);
    }

    #[test]
    fn test_split_at_first_terminal_after_threshold() {
        let chunks = Chunker::new(5).chunk_str("abcdef? ghi");
        assert_eq!(texts(&chunks), ["abcdef?", "ghi"]);
    }

    #[test]
    fn test_terminal_before_threshold_is_not_a_boundary() {
        let chunks = Chunker::new(10).chunk_str("abcdefgh?ij");
        assert_eq!(texts(&chunks), ["abcdefgh?ij"]);
    }

    #[test]
    fn test_multiple_sentences_on_one_line() {
        let chunks = Chunker::new(3).chunk_str("ab?cd!ef");
        assert_eq!(texts(&chunks), ["ab?", "cd!", "ef"]);
    }

    #[test]
    fn test_cjk_terminals_and_code_point_lengths() {
        let chunks = Chunker::new(3).chunk_str("你好。再见！");
        assert_eq!(texts(&chunks), ["你好。", "再见！"]);
    }

    #[test]
    fn test_tail_carries_into_next_line() {
        let chunks = Chunker::new(6).chunk_str("abcdefg? hij\nklm!");
        assert_eq!(texts(&chunks), ["abcdefg?", "hij\nklm!"]);
    }

    #[test]
    fn test_quotes_are_replaced_with_spaces() {
        let chunks = Chunker::default().chunk_str("He said \"hi\" and 'bye'\n「你好」『再见』“ok” ‘no’");
        assert_eq!(chunks.len(), 1);
        let text = chunks[0].as_str();
        for q in QUOTES {
            assert!(!text.contains(q), "quote {:?} survived", q);
        }
        assert!(text.starts_with("He said  hi  and  bye"));
        assert!(text.ends_with("ok   no"));
    }

    #[test]
    fn test_quote_only_line_produces_no_chunk() {
        assert!(Chunker::new(1).chunk_str("\"\"").is_empty());
    }

    #[test]
    fn test_boundaries_follow_terminals() {
        let text = (0..40)
            .map(|i| format!("Sentence number {} is here? Another clause {}!", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = Chunker::new(50).chunk_str(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            let last = chunk.as_str().chars().last().unwrap();
            assert!(is_terminal(last), "chunk ended with {:?}", last);
        }
    }

    #[test]
    fn test_no_text_is_lost() {
        let text = (0..30)
            .map(|i| format!("line {} says something? and then more words {}!", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        for max in [1, 7, 40, 384] {
            let chunks = Chunker::new(max).chunk_str(&text);
            let got: Vec<&str> = chunks
                .iter()
                .flat_map(|c| c.as_str().split_whitespace())
                .collect();
            let want: Vec<&str> = text.split_whitespace().collect();
            assert_eq!(got.join(" "), want.join(" "), "max_chars = {}", max);
            assert!(chunks.iter().all(|c| !c.as_str().is_empty()));
        }
    }

    /// Deterministic lines of 1..max_chars code points drawn from a mixed
    /// alphabet (ASCII, CJK, quotes, terminals).
    fn short_lines(max_chars: usize, count: usize, mut seed: u64) -> Vec<String> {
        const ALPHABET: [char; 14] = [
            'a', 'b', 'z', '.', ',', '中', '文', '“', '」', '?', '!', '。', '？', '！',
        ];
        let mut next = move || {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };
        (0..count)
            .map(|_| {
                let len = 1 + next() % (max_chars - 1);
                (0..len).map(|_| ALPHABET[next() % ALPHABET.len()]).collect()
            })
            .collect()
    }

    #[test]
    fn test_short_lines_keep_chunks_bounded() {
        // With every line under `max_chars`, the carried buffer stays under
        // 2 * max_chars, so a chunk never reaches 3 * max_chars.
        for max in [2, 5, 16, 40] {
            for seed in 0..20u64 {
                let lines = short_lines(max, 200, seed);
                assert!(lines.iter().all(|l| l.chars().count() < max));
                let text = lines.join("\n");
                let chunks = Chunker::new(max).chunk_str(&text);
                assert!(!chunks.is_empty());
                for chunk in &chunks {
                    assert!(
                        chunk.char_len() < 3 * max,
                        "max_chars = {}, seed = {}, chunk of {} chars: {:?}",
                        max,
                        seed,
                        chunk.char_len(),
                        chunk.as_str()
                    );
                }
            }
        }
    }

    #[test]
    fn test_short_lines_without_terminals_merge_below_twice_max() {
        for max in [5, 16, 40] {
            let text = short_lines(max, 100, 7)
                .into_iter()
                .map(|l| l.replace(&TERMINALS[..], ","))
                .collect::<Vec<_>>()
                .join("\n");
            for chunk in Chunker::new(max).chunk_str(&text) {
                assert!(chunk.char_len() < 2 * max, "max_chars = {}", max);
            }
        }
    }

    #[test]
    fn test_rechunking_output_never_merges_chunks() {
        let text = (0..20)
            .map(|i| format!("Question {} goes here? Answer {} follows!", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let chunker = Chunker::new(30);
        let first = chunker.chunk_str(&text);
        for chunk in &first {
            let again = chunker.chunk_str(&chunk.as_str().replace('\n', " "));
            assert!(!again.is_empty());
            let joined: Vec<&str> = again
                .iter()
                .flat_map(|c| c.as_str().split_whitespace())
                .collect();
            let original: Vec<&str> = chunk.as_str().split_whitespace().collect();
            assert_eq!(joined, original);
        }
    }

    #[test]
    fn test_stream_matches_chunk_str() {
        let text = "First line? yes!\nsecond line here\n\nthird。line！end";
        let chunker = Chunker::new(8);
        let streamed: Vec<Chunk> = chunker
            .chunks(Cursor::new(text))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(streamed, chunker.chunk_str(text));
    }

    #[test]
    fn test_stream_surfaces_invalid_utf8() {
        let bytes = vec![b'o', b'k', b'\n', 0xff, 0xfe, b'\n'];
        let mut stream = Chunker::default().chunks(Cursor::new(bytes));
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_max_chars_clamped() {
        assert_eq!(Chunker::new(0).max_chars(), 1);
        assert_eq!(Chunker::default().max_chars(), DEFAULT_MAX_CHARS);
    }
}
