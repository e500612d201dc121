use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use netgraph_lens::scene::LayoutHints;
use netgraph_lens::util::stable_pair;

/// Static force-directed layout. Seeds come from the node ids so the same
/// scene always lays out the same way.
pub(super) fn force_layout(
    node_ids: &[&str],
    edges: &[(usize, usize)],
    node_radii: &[f32],
    hints: LayoutHints,
    iterations: usize,
) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let (min_length, max_length) = hints.edge_length;
    let ideal_edge = ((min_length + max_length) * 0.5).max(10.0);
    let base_radius = (n as f32).sqrt() * ideal_edge * 0.9;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / n as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx, jy) * ideal_edge * 0.6;
            let radial = vec2(angle.cos(), angle.sin()) * base_radius;
            radial + jitter
        })
        .collect::<Vec<_>>();

    if n == 1 {
        positions[0] = Vec2::ZERO;
        return positions;
    }

    let repulsion = hints.repulsion.max(1.0) * ideal_edge * 0.5;
    let mut temperature = (ideal_edge * 1.5).max(60.0);

    for _ in 0..iterations {
        let mut disp = vec![Vec2::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length().max(0.5);
                let direction = delta / distance;

                let ri = node_radii.get(i).copied().unwrap_or(5.0);
                let rj = node_radii.get(j).copied().unwrap_or(5.0);
                let min_distance = (ri + rj) * 1.6;

                let force = repulsion / distance;
                disp[i] += direction * force;
                disp[j] -= direction * force;

                if distance < min_distance {
                    let overlap_push = (min_distance - distance) * 1.2;
                    disp[i] += direction * overlap_push;
                    disp[j] -= direction * overlap_push;
                }
            }
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;

            let target = distance.clamp(min_length, max_length.max(min_length));
            let spring = (distance - target.min(ideal_edge)) * 0.12;

            disp[from] -= direction * spring;
            disp[to] += direction * spring;
        }

        for i in 0..n {
            disp[i] -= positions[i] * 0.002;
        }

        for i in 0..n {
            let d = disp[i];
            let length = d.length();
            if length > 0.0 {
                positions[i] += d / length * length.min(temperature) * 0.9;
            }
        }

        temperature *= 0.96;
        if temperature < 0.5 {
            break;
        }
    }

    positions
}
