/// Caps how far the crop may move between consecutive frames.
///
/// Works on integer offsets so the bound holds exactly on the values that
/// get rendered. Each step moves toward the requested offset by at most
/// `max_step` pixels, starting from the first requested offset. Since every
/// output lies between two in-bounds values, clamped input stays clamped.
pub struct VelocityLimiter {
    max_step: Option<u32>,
}

impl VelocityLimiter {
    pub fn new(max_step: Option<u32>) -> Self {
        Self { max_step }
    }

    pub fn limit(&self, offsets: &[u32]) -> Vec<u32> {
        let Some(max_step) = self.max_step else {
            return offsets.to_vec();
        };

        let mut result = Vec::with_capacity(offsets.len());
        let mut prev: Option<u32> = None;
        for &target in offsets {
            let next = match prev {
                None => target,
                Some(p) if target > p => p + (target - p).min(max_step),
                Some(p) => p - (p - target).min(max_step),
            };
            result.push(next);
            prev = Some(next);
        }
        result
    }
}
