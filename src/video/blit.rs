use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::{Raster, Sample};

/// Paste `src` onto a copy of `dst` with its top-left corner at `pos`.
///
/// Only the part of `src` that overlaps `dst` is written; everything else is dropped. With a
/// `mask`, each overlapping pixel becomes `m * src + (1 - m) * dst`, otherwise `src` overwrites
/// `dst`. The mask must cover `src` pixel for pixel.
pub fn blit<P: Sample>(
    src: &Raster<P>,
    dst: &Raster<P>,
    pos: (i64, i64),
    mask: Option<&Raster<f32>>,
) -> MontageResult<Raster<P>> {
    if src.channels() != dst.channels() {
        return Err(MontageError::validation(format!(
            "cannot blit a {}-channel frame onto a {}-channel frame",
            src.channels(),
            dst.channels()
        )));
    }
    if let Some(m) = mask
        && (m.size() != src.size() || m.channels() != 1)
    {
        return Err(MontageError::validation(format!(
            "blit mask is {}x{}x{}, expected {}x{}x1",
            m.width(),
            m.height(),
            m.channels(),
            src.width(),
            src.height()
        )));
    }

    let (xp, yp) = pos;
    let (w1, h1) = (i64::from(src.width()), i64::from(src.height()));
    let (w2, h2) = (i64::from(dst.width()), i64::from(dst.height()));

    let (xp1, xp2) = (xp.max(0), (xp + w1).min(w2));
    let (yp1, yp2) = (yp.max(0), (yp + h1).min(h2));
    let (x1, y1) = ((-xp).max(0), (-yp).max(0));

    let mut out = dst.clone();
    if xp1 >= xp2 || yp1 >= yp2 {
        return Ok(out);
    }

    // Offsets are non-negative and bounded by the frame sizes past this point.
    for dy in 0..(yp2 - yp1) {
        let sy = (y1 + dy) as u32;
        let oy = (yp1 + dy) as u32;
        for dx in 0..(xp2 - xp1) {
            let sx = (x1 + dx) as u32;
            let ox = (xp1 + dx) as u32;
            let s = src.pixel(sx, sy);
            let d = out.pixel_mut(ox, oy);
            match mask {
                None => d.copy_from_slice(s),
                Some(m) => {
                    let a = m.pixel(sx, sy)[0];
                    for (dv, sv) in d.iter_mut().zip(s) {
                        *dv = P::from_f32(a * sv.to_f32() + (1.0 - a) * dv.to_f32());
                    }
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/video/blit.rs"]
mod tests;
