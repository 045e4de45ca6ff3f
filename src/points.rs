//! 点群ファイルと結果ファイルのテキスト形式。
//!
//! 1行目はヘッダで、以降は空白区切りの数値が1行に1点ずつ並びます。
//! 実数は `%.10E` (仮数部は小数点以下10桁、指数部は符号付きで2桁以上) で書き出します。

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::rows::{ResultRow, SampleRow};

/// 点群ファイルのヘッダ
pub const POINT_CLOUD_HEADER: &str = "nodenumber     x-coordinate     y-coordinate     z-coordinate";

/// 結果ファイルのヘッダ
pub const RESULT_HEADER: &str = "nodenumber     x-coordinate     y-coordinate     z-coordinate     x-velocity     y-velocity     z-velocity     velocity-magnitude     pressure";

const SEPARATOR: &str = "   ";

/// `%.10E` 形式で実数を表示します。`sign_space` が真なら正の値の前に空白を置きます (`% .10E`)。
#[derive(Debug, Clone, Copy)]
pub struct Sci {
    pub value: f64,
    pub sign_space: bool,
}

impl Sci {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            sign_space: false,
        }
    }

    pub fn signed(value: f64) -> Self {
        Self {
            value,
            sign_space: true,
        }
    }
}

impl fmt::Display for Sci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.value;
        if self.sign_space && !v.is_sign_negative() {
            f.write_str(" ")?;
        }
        if v.is_nan() {
            return f.write_str("NAN");
        }
        if v.is_infinite() {
            return f.write_str(if v < 0.0 { "-INF" } else { "INF" });
        }

        let s = format!("{v:.10E}");
        let (mantissa, exponent) = s.split_once('E').ok_or(fmt::Error)?;
        let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{mantissa}E{sign}{:02}", exponent.unsigned_abs())
    }
}

/// 入力点ファイルを読み込みます。
pub fn load_sample_rows(path: &Path) -> Result<Vec<SampleRow>> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    read_sample_rows(BufReader::new(File::open(path)?))
}

/// ヘッダ行を読み飛ばし、`node_id x y z` の各行を解析します。
///
/// 空行と `#` で始まる行は無視し、5列目以降は使いません。
pub fn read_sample_rows<R: BufRead>(reader: R) -> Result<Vec<SampleRow>> {
    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        rows.push(parse_sample_row(line, i + 1)?);
    }
    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(rows)
}

fn parse_sample_row(line: &str, line_no: usize) -> Result<SampleRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(Error::Parse {
            line: line_no,
            reason: format!("4列以上必要ですが {} 列しかありません", fields.len()),
        });
    }
    let float = |s: &str| {
        s.parse::<f64>().map_err(|e| Error::Parse {
            line: line_no,
            reason: format!("'{s}' は数値ではありません ({e})"),
        })
    };
    Ok(SampleRow {
        node_id: parse_node_id(fields[0], line_no)?,
        x: float(fields[1])?,
        y: float(fields[2])?,
        z: float(fields[3])?,
    })
}

/// 節点番号は整数のほか、`1.0000000000E+00` のような整数値の実数表記も受け付けます。
fn parse_node_id(s: &str, line_no: usize) -> Result<i64> {
    if let Ok(id) = s.parse::<i64>() {
        return Ok(id);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(Error::Parse {
            line: line_no,
            reason: format!("'{s}' は節点番号として解釈できません"),
        }),
    }
}

/// 点に1から始まる節点番号を付けて書き出します。
pub fn write_point_cloud<W: Write>(out: W, points: &[[f64; 3]]) -> Result<()> {
    let mut out = BufWriter::new(out);
    writeln!(out, "{POINT_CLOUD_HEADER}")?;
    for (i, [x, y, z]) in points.iter().enumerate() {
        writeln!(
            out,
            "{:10}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            i + 1,
            Sci::signed(*x),
            Sci::signed(*y),
            Sci::signed(*z)
        )?;
    }
    out.flush()?;
    Ok(())
}

/// 結果行をヘッダ付きで書き出します。
pub fn write_results<W: Write>(out: W, rows: &[ResultRow]) -> Result<()> {
    let mut out = BufWriter::new(out);
    writeln!(out, "{RESULT_HEADER}")?;
    for r in rows {
        write!(out, "{:12}", r.node_id)?;
        for v in [r.x, r.y, r.z, r.u, r.v, r.w, r.velocity_magnitude, r.p] {
            write!(out, "{SEPARATOR}{}", Sci::new(v))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// 出力先のディレクトリを作成してからファイルを開きます。
pub fn create_output(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_matches_printf_exponent_style() {
        assert_eq!(Sci::new(5.0).to_string(), "5.0000000000E+00");
        assert_eq!(Sci::new(-0.00123).to_string(), "-1.2300000000E-03");
        assert_eq!(Sci::new(0.0).to_string(), "0.0000000000E+00");
        assert_eq!(Sci::new(1e100).to_string(), "1.0000000000E+100");
        assert_eq!(Sci::new(12345.678901234).to_string(), "1.2345678901E+04");
    }

    #[test]
    fn signed_sci_pads_positive_values() {
        assert_eq!(Sci::signed(1.5).to_string(), " 1.5000000000E+00");
        assert_eq!(Sci::signed(-1.5).to_string(), "-1.5000000000E+00");
        assert_eq!(Sci::new(f64::NAN).to_string(), "NAN");
        assert_eq!(Sci::new(f64::NEG_INFINITY).to_string(), "-INF");
    }

    #[test]
    fn reads_rows_after_header() {
        let text = "nodenumber x y z\n\
                    1   1.0E-03  -2.5  3\n\
                    \n\
                    2.0000000000E+00   0 0 0   9.9\n";
        let rows = read_sample_rows(text.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                SampleRow { node_id: 1, x: 1.0e-3, y: -2.5, z: 3.0 },
                SampleRow { node_id: 2, x: 0.0, y: 0.0, z: 0.0 },
            ]
        );
    }

    #[test]
    fn too_few_columns_is_a_parse_error() {
        let err = read_sample_rows("header\n1 2 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn non_numeric_field_is_a_parse_error() {
        let err = read_sample_rows("header\n1 2 abc 4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
        let err = read_sample_rows("header\n1.5 2 3 4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(matches!(
            read_sample_rows("nodenumber x y z\n".as_bytes()),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(read_sample_rows("".as_bytes()), Err(Error::EmptyInput)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_sample_rows(Path::new("/nonexistent/points.txt")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn point_cloud_layout() {
        let mut buf = Vec::new();
        write_point_cloud(&mut buf, &[[0.001, -0.002, 0.0]]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(POINT_CLOUD_HEADER));
        assert_eq!(
            lines.next(),
            Some("         1    1.0000000000E-03   -2.0000000000E-03    0.0000000000E+00")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn point_cloud_can_be_read_back() {
        let mut buf = Vec::new();
        write_point_cloud(&mut buf, &[[1.0, 2.0, 3.0], [-4.0, 5.0, -6.0]]).unwrap();
        let rows = read_sample_rows(buf.as_slice()).unwrap();
        assert_eq!(rows[1], SampleRow { node_id: 2, x: -4.0, y: 5.0, z: -6.0 });
    }

    #[test]
    fn result_layout() {
        let row = ResultRow {
            node_id: 1,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            u: 3.0,
            v: 4.0,
            w: 0.0,
            velocity_magnitude: 5.0,
            p: -1.0,
        };
        let mut buf = Vec::new();
        write_results(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], RESULT_HEADER);
        assert_eq!(
            lines[1],
            "           1   0.0000000000E+00   0.0000000000E+00   0.0000000000E+00   \
             3.0000000000E+00   4.0000000000E+00   0.0000000000E+00   \
             5.0000000000E+00   -1.0000000000E+00"
        );
    }
}
