use crate::elements::triangle::Otri;
use crate::elements::vertex::{Vertex, VertexId, VertexKind};
use crate::planar::refine_params::RefineParams;
use crate::planar::refine_procedures::quality::RefineReport;
use crate::planar::triangulation::Triangulation;
use crate::planar::triangulation_procedures::skeleton;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_steiner_limit() -> i64 {
    -1
}

/**
 * The JSON description of a refinement job: a PSLG plus quality
 * targets. Only `vertices` is required.
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TriangulationInput {
    pub vertices: Vec<[f64; 2]>,
    #[serde(default)]
    pub attributes: Vec<Vec<f64>>,
    #[serde(default)]
    pub segments: Vec<[usize; 2]>,
    #[serde(default)]
    pub segment_marks: Vec<i32>,
    #[serde(default)]
    pub min_angle: f64,
    #[serde(default)]
    pub max_angle: f64,
    #[serde(default)]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub conform_del: bool,
    #[serde(default)]
    pub no_bisect: u8,
    #[serde(default = "default_steiner_limit")]
    pub steiner_limit: i64,
}

impl TriangulationInput {
    pub fn refine_params(&self) -> RefineParams {
        let mut params = RefineParams::new(self.min_angle);
        if self.max_angle != 0.0 {
            params = params.with_max_angle(self.max_angle);
        }
        if let Some(max_area) = self.max_area {
            params = params.with_max_area(max_area);
        }
        params.conform_del = self.conform_del;
        params.no_bisect = self.no_bisect;
        params.steiner_limit = self.steiner_limit;
        return params;
    }

    pub fn build(&self) -> Triangulation {
        let vertices: Vec<Vertex> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(index, &[x, y])| match self.attributes.get(index) {
                Some(attributes) => Vertex::with_attributes(x, y, attributes.clone()),
                None => Vertex::new(x, y),
            })
            .collect();
        let segments: Vec<(usize, usize)> =
            self.segments.iter().map(|&[i, j]| (i, j)).collect();
        return skeleton::build(vertices, &segments, &self.segment_marks);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OutputVertex {
    pub x: f64,
    pub y: f64,
    pub mark: i32,
    pub kind: String,
}

/**
 * The JSON result: the refined vertex list and triangle index triples,
 * with run statistics.
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TriangulationOutput {
    pub vertices: Vec<OutputVertex>,
    pub triangles: Vec<[usize; 3]>,
    pub steiner_points: usize,
    pub smallest_angle: f64,
}

impl TriangulationOutput {
    pub fn from_triangulation(mesh: &Triangulation, report: &RefineReport) -> Self {
        let mut dense: HashMap<VertexId, usize> = HashMap::new();
        let mut vertices: Vec<OutputVertex> = Vec::new();
        for id in mesh.live_vertex_ids() {
            let vertex = mesh.vertex(id);
            dense.insert(id, vertices.len());
            vertices.push(OutputVertex {
                x: vertex.x,
                y: vertex.y,
                mark: vertex.mark,
                kind: kind_label(vertex.kind).to_string(),
            });
        }

        let mut triangles: Vec<[usize; 3]> = Vec::new();
        for id in mesh.real_triangle_ids() {
            let t = Otri::new(id, 0);
            triangles.push([
                dense[&mesh.org(t)],
                dense[&mesh.dest(t)],
                dense[&mesh.apex(t)],
            ]);
        }

        return Self {
            vertices,
            triangles,
            steiner_points: report.steiner_points,
            smallest_angle: mesh.smallest_angle(),
        };
    }
}

fn kind_label(kind: VertexKind) -> &'static str {
    match kind {
        VertexKind::Input => "input",
        VertexKind::SegmentVertex => "segment",
        VertexKind::FreeVertex => "free",
        VertexKind::Undead => "undead",
    }
}

#[cfg(test)]
mod serialization {
    use super::*;

    #[test]
    fn test_minimal_input_document() {
        let document = r#"{ "vertices": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] }"#;
        let input: TriangulationInput = serde_json::from_str(document).unwrap();
        assert_eq!(input.vertices.len(), 3);
        assert!(input.segments.is_empty());
        assert_eq!(input.steiner_limit, -1);
        assert_eq!(input.min_angle, 0.0);
    }

    #[test]
    fn test_full_input_round_trip() {
        let input = TriangulationInput {
            vertices: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            attributes: vec![],
            segments: vec![[0, 2]],
            segment_marks: vec![5],
            min_angle: 20.0,
            max_angle: 0.0,
            max_area: Some(0.1),
            conform_del: true,
            no_bisect: 1,
            steiner_limit: 50,
        };
        let text = serde_json::to_string(&input).unwrap();
        let back: TriangulationInput = serde_json::from_str(&text).unwrap();
        assert_eq!(back.segments, vec![[0, 2]]);
        assert_eq!(back.max_area, Some(0.1));
        assert_eq!(back.steiner_limit, 50);
        assert!(back.conform_del);
    }

    #[test]
    fn test_refine_params_mapping() {
        let document = r#"{
            "vertices": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            "min_angle": 25.0,
            "max_area": 0.25,
            "no_bisect": 2
        }"#;
        let input: TriangulationInput = serde_json::from_str(document).unwrap();
        let params = input.refine_params();
        assert_eq!(params.min_angle, 25.0);
        assert!(params.fixed_area);
        assert_eq!(params.max_area, 0.25);
        assert_eq!(params.no_bisect, 2);
        assert_eq!(params.steiner_limit, -1);
    }
}
