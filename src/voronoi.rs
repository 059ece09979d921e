use crate::utils::{cross, invert_lattice, vdot};

/// Finds which of the vectors to neighbouring points contribute a face to the
/// Voronoi cell of the origin. Returns their indices in the order given.
///
/// The cell is bounded by the bisector planes x.r = |r|^2 / 2. Its vertices
/// are found as the intersections of every triple of bisectors lying inside
/// all the others, and a vector keeps its face if the polygon formed by the
/// vertices on its bisector has a non-zero area.
pub fn voronoi_faces(vectors: &[[f64; 3]]) -> Vec<usize> {
    let mut faces = Vec::with_capacity(vectors.len());
    let mut vertices = Vec::<[f64; 3]>::with_capacity(28);
    let mut vector_basis = [[0f64; 3]; 3];
    let mut vector_mag = [0f64; 3];
    'vector: for (vec_i, r) in vectors.iter().enumerate() {
        vertices.clear();
        vector_basis[0] = *r;
        vector_mag[0] = vdot(*r, *r) * 0.5;
        for (neigh_a, a) in vectors.iter().enumerate() {
            if neigh_a == vec_i {
                continue;
            }
            vector_basis[1] = *a;
            vector_mag[1] = vdot(*a, *a) * 0.5;
            'neigh_b: for (neigh_b, b) in vectors.iter().enumerate().skip(neigh_a + 1) {
                if neigh_b == vec_i {
                    continue;
                }
                vector_basis[2] = *b;
                vector_mag[2] = vdot(*b, *b) * 0.5;
                let vector_inv = match invert_lattice(&vector_basis) {
                    Ok(inv) => inv,
                    Err(_) => continue 'neigh_b,
                };
                let mut vertex = [0f64; 3];
                for (i, v) in vertex.iter_mut().enumerate() {
                    *v = vdot(vector_inv[i], vector_mag);
                }
                for check in vectors.iter() {
                    if vdot(vertex, *check) > 0.5 * vdot(*check, *check) + 1E-8 {
                        continue 'neigh_b;
                    }
                }
                let vertex_mag = vdot(vertex, vertex);
                if (vertex_mag - 0.25 * vdot(*r, *r)).abs() < 1E-8 {
                    // the bisector only touches the cell at the midpoint
                    continue 'vector;
                } else if vertex_mag > 0. {
                    vertices.push(vertex);
                }
            }
        }
        if vertices.len() < 3 {
            continue 'vector;
        }
        if polygon_alpha(&vertices, *r).abs() < 1E-8 {
            continue 'vector;
        }
        faces.push(vec_i);
    }
    faces
}

/// The signed area of the polygon around r, scaled by 1 / |r|^2.
fn polygon_alpha(vertices: &[[f64; 3]], r: [f64; 3]) -> f64 {
    let r2 = vdot(r, r);
    // an in-plane basis rx, ry for ordering the vertices by angle
    let mut rx = vertices[0];
    let r_coeff = vdot(rx, r) / r2;
    for (i, r) in r.iter().enumerate() {
        rx[i] -= r * r_coeff;
    }
    let rx_norm = vdot(rx, rx);
    if rx_norm <= 0. {
        return 0.;
    }
    let rx = rx.map(|x| x * rx_norm.powf(-0.5));
    let ry = cross(r, rx);
    let ry_norm = vdot(ry, ry).powf(-0.5);
    let ry = ry.map(|x| x * ry_norm);
    let mut sorted = vertices.to_vec();
    sorted.sort_unstable_by(|a, b| {
        let c = vdot(*a, ry).atan2(vdot(*a, rx));
        let d = vdot(*b, ry).atan2(vdot(*b, rx));
        c.total_cmp(&d)
    });
    let num_vertices = sorted.len();
    sorted
        .iter()
        .enumerate()
        .map(|(i, v)| vdot(*v, cross(sorted[(i + 1) % num_vertices], r)))
        .sum::<f64>()
        / (2. * r2)
}
