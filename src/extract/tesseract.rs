//! Reads Tesseract's TSV output (`tesseract image out tsv`) into
//! [`OcrOutput::WithGeometry`].

use crate::extract::model::{BBox, OcrLine, OcrOutput, Word};

const TSV_MIN_FIELDS: usize = 12;
const TSV_WORD_LEVEL: u32 = 5;

type LineKey = (u32, u32, u32, u32);

fn parse_field<T: std::str::FromStr + Default>(field: &str) -> T {
    field.trim().parse().unwrap_or_default()
}

/// Parses word rows, grouping them by page/block/paragraph/line.
///
/// Malformed rows are skipped. Confidence is kept as reported; the clusterer
/// applies its own floor.
#[must_use]
pub fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut keys: Vec<LineKey> = Vec::new();
    let mut lines: Vec<OcrLine> = Vec::new();

    for (index, row) in tsv.lines().enumerate() {
        if index == 0 && row.starts_with("level") {
            continue;
        }

        let fields = row.split('\t').collect::<Vec<_>>();
        if fields.len() < TSV_MIN_FIELDS || parse_field::<u32>(fields[0]) != TSV_WORD_LEVEL {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let left: f32 = parse_field(fields[6]);
        let top: f32 = parse_field(fields[7]);
        let width: f32 = parse_field(fields[8]);
        let height: f32 = parse_field(fields[9]);
        let confidence = fields[10].trim().parse::<f32>().unwrap_or(-1.0);
        let word = Word::new(
            text,
            BBox {
                x0: left,
                y0: top,
                x1: left + width,
                y1: top + height,
            },
            confidence,
        );

        let key = (
            parse_field(fields[1]),
            parse_field(fields[2]),
            parse_field(fields[3]),
            parse_field(fields[4]),
        );
        if keys.last() == Some(&key) {
            if let Some(line) = lines.last_mut() {
                line.words.push(word);
            }
        } else {
            keys.push(key);
            lines.push(OcrLine { words: vec![word] });
        }
    }

    let text = lines
        .iter()
        .map(|line| {
            line.words
                .iter()
                .map(|word| word.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    if lines.is_empty() {
        OcrOutput::TextOnly { text }
    } else {
        OcrOutput::WithGeometry { text, lines }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_tsv;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn groups_words_by_line() {
        let tsv = format!(
            "{HEADER}\n\
             4\t1\t1\t1\t1\t0\t10\t10\t200\t20\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t96.1\tSample\n\
             5\t1\t1\t1\t1\t2\t110\t10\t40\t20\t91.0\tSiO2\n\
             5\t1\t1\t1\t2\t1\t10\t40\t40\t20\t88.5\tA-1\n\
             5\t1\t1\t1\t2\t2\t110\t40\t40\t20\t73.0\t48.2"
        );

        let output = parse_tsv(&tsv);
        assert!(output.has_geometry());
        assert_eq!(output.lines().len(), 2);
        assert_eq!(output.text(), "Sample SiO2\nA-1 48.2");

        let sio2 = &output.lines()[0].words[1];
        assert_eq!(sio2.bbox.x0, 110.0);
        assert_eq!(sio2.bbox.x1, 150.0);
        assert_eq!(sio2.confidence, 91.0);
    }

    #[test]
    fn skips_malformed_and_blank_rows() {
        let tsv = format!(
            "{HEADER}\n\
             5\t1\t1\n\
             5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t96.1\t \n\
             not a row"
        );
        let output = parse_tsv(&tsv);
        assert!(!output.has_geometry());
        assert_eq!(output.text(), "");
    }
}
