use std::collections::VecDeque;

/// Labels 26-connected components of `mask` (x-fastest layout, extent
/// `dims`). Returns per-voxel labels (0 = background, 1..=n) and n.
pub fn label_components(mask: &[bool], dims: [usize; 3]) -> (Vec<u32>, usize) {
    let [nx, ny, nz] = dims;
    let mut labels = vec![0u32; mask.len()];
    let mut count = 0u32;
    let mut queue = VecDeque::new();

    for start in 0..mask.len() {
        if !mask[start] || labels[start] != 0 {
            continue;
        }
        count += 1;
        labels[start] = count;
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            let x = idx % nx;
            let y = (idx / nx) % ny;
            let z = idx / (nx * ny);

            for dz in -1i64..=1 {
                let zz = z as i64 + dz;
                if zz < 0 || zz >= nz as i64 {
                    continue;
                }
                for dy in -1i64..=1 {
                    let yy = y as i64 + dy;
                    if yy < 0 || yy >= ny as i64 {
                        continue;
                    }
                    for dx in -1i64..=1 {
                        let xx = x as i64 + dx;
                        if xx < 0 || xx >= nx as i64 {
                            continue;
                        }
                        let n = xx as usize + nx * (yy as usize + ny * zz as usize);
                        if mask[n] && labels[n] == 0 {
                            labels[n] = count;
                            queue.push_back(n);
                        }
                    }
                }
            }
        }
    }

    (labels, count as usize)
}
