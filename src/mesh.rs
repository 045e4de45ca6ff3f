//! 表面メッシュの読み込み。
//!
//! STL (バイナリ / ASCII) と Wavefront OBJ に対応し、拡張子で形式を判定します。

use std::io::BufRead;
use std::path::Path;

use nalgebra::Vector3;

use crate::error::{Error, Result};

/// 三角形の集まりとしての表面メッシュ。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub triangles: Vec<[Vector3<f64>; 3]>,
}

impl TriangleMesh {
    pub fn new(triangles: Vec<[Vector3<f64>; 3]>) -> Self {
        Self { triangles }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// 各三角形の面積。
    pub fn areas(&self) -> Vec<f64> {
        self.triangles
            .iter()
            .map(|[a, b, c]| 0.5 * (b - a).cross(&(c - a)).norm())
            .collect()
    }

    pub fn surface_area(&self) -> f64 {
        self.areas().iter().sum()
    }

    /// ファイルからメッシュを読み込みます。
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "stl" => parse_stl(&std::fs::read(path)?),
            "obj" => {
                let (models, _materials) = tobj::load_obj(path, &obj_load_options()).map_err(obj_error)?;
                mesh_from_obj_models(&models)
            }
            other => Err(Error::Mesh(format!("未対応の拡張子です: .{other}"))),
        }
    }
}

/// STL を読み込みます。
///
/// 三角形数から計算したサイズとファイルサイズが一致すればバイナリ、
/// そうでなく `solid` で始まっていれば ASCII として扱います。
pub fn parse_stl(data: &[u8]) -> Result<TriangleMesh> {
    if data.len() >= 84 {
        let n = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
        if 84 + n * 50 == data.len() {
            return Ok(parse_binary_stl(data, n));
        }
    }
    let text = std::str::from_utf8(data).ok().filter(|t| t.trim_start().starts_with("solid"));
    match text {
        Some(text) => parse_ascii_stl(text),
        None => Err(Error::Mesh(format!(
            "STL として解釈できません ({} バイト)",
            data.len()
        ))),
    }
}

fn parse_binary_stl(data: &[u8], n: usize) -> TriangleMesh {
    let read_f32 = |o: usize| f32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]);
    let read_vec3 = |o: usize| {
        Vector3::new(
            f64::from(read_f32(o)),
            f64::from(read_f32(o + 4)),
            f64::from(read_f32(o + 8)),
        )
    };

    let triangles = (0..n)
        .map(|i| {
            // 法線 (12 バイト) は使わない
            let base = 84 + i * 50 + 12;
            [read_vec3(base), read_vec3(base + 12), read_vec3(base + 24)]
        })
        .collect();
    TriangleMesh::new(triangles)
}

fn parse_ascii_stl(text: &str) -> Result<TriangleMesh> {
    let mut triangles = Vec::new();
    let mut corners = Vec::with_capacity(3);
    for (i, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("vertex") => corners.push(parse_vec3(tokens, i + 1)?),
            Some("endloop") => {
                let [a, b, c] = <[Vector3<f64>; 3]>::try_from(std::mem::take(&mut corners))
                    .map_err(|v| {
                        Error::Mesh(format!("{} 行目: 頂点が {} 個の面は扱えません", i + 1, v.len()))
                    })?;
                triangles.push([a, b, c]);
            }
            _ => {}
        }
    }
    Ok(TriangleMesh::new(triangles))
}

/// 多角形の面を三角形に分割し、頂点番号を位置だけで振り直す読み込み設定。
fn obj_load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

fn obj_error(e: tobj::LoadError) -> Error {
    Error::Mesh(format!("OBJ を読み込めません: {e}"))
}

/// メモリ上の OBJ を読み込みます。マテリアル (`mtllib`) は無視します。
pub fn read_obj<R: BufRead>(reader: &mut R) -> Result<TriangleMesh> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &obj_load_options(), |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(obj_error)?;
    mesh_from_obj_models(&models)
}

/// 全てのモデルの三角形を1つのメッシュにまとめます。
fn mesh_from_obj_models(models: &[tobj::Model]) -> Result<TriangleMesh> {
    let mut triangles = Vec::new();
    for model in models {
        let mesh = &model.mesh;
        let vertex = |i: u32| -> Result<Vector3<f64>> {
            let i = i as usize * 3;
            mesh.positions
                .get(i..i + 3)
                .map(|p| Vector3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])))
                .ok_or_else(|| Error::Mesh(format!("'{}': 頂点番号 {} が範囲外です", model.name, i / 3)))
        };
        for face in mesh.indices.chunks_exact(3) {
            triangles.push([vertex(face[0])?, vertex(face[1])?, vertex(face[2])?]);
        }
    }
    Ok(TriangleMesh::new(triangles))
}

fn parse_vec3<'a>(mut tokens: impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vector3<f64>> {
    let mut next = || -> Result<f64> {
        let token = tokens
            .next()
            .ok_or_else(|| Error::Mesh(format!("{line_no} 行目: 座標が足りません")))?;
        token
            .parse()
            .map_err(|_| Error::Mesh(format!("{line_no} 行目: '{token}' は数値ではありません")))
    };
    Ok(Vector3::new(next()?, next()?, next()?))
}
