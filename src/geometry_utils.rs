/// Scale a normalised coordinate in [0;1] to pixels along an axis of the given extent
pub fn to_pixels(normalised: f32, extent: u32) -> f32 {
    normalised * extent as f32
}

/// Every integer pixel on the line from (x0,y0) to (x1,y1), inclusive of both ends
/// (Bresenham's algorithm)
pub fn line_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;
    let mut points = Vec::with_capacity((dx - dy) as usize + 1);

    loop {
        points.push((x, y));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    points
}

/// Every integer pixel inside a filled circle
pub fn disc_points(cx: i32, cy: i32, radius: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                points.push((cx + dx, cy + dy));
            }
        }
    }
    points
}
