use crate::elements::vertex::Vertex;

pub fn distance2(v1: &Vertex, v2: &Vertex) -> f64 {
    (v1.x - v2.x).powi(2) + (v1.y - v2.y).powi(2)
}

pub fn distance(v1: &Vertex, v2: &Vertex) -> f64 {
    return distance2(v1, v2).sqrt();
}
