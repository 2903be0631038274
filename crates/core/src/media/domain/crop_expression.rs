use crate::trajectory::domain::crop_trajectory::CropTrajectory;

/// A run of consecutive frames sharing one offset, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Segment {
    first: usize,
    last: usize,
    offset: u32,
}

/// Per-frame crop x position as an ffmpeg expression over the frame
/// counter `n`.
///
/// Runs of equal offsets collapse into one `between(n,a,b)*x` term and the
/// terms are summed, so exactly one term is non-zero for any frame. A final
/// `gte(n,len)*last` term keeps frames past the trajectory on its last
/// offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CropExpression {
    segments: Vec<Segment>,
    len: usize,
}

impl CropExpression {
    pub fn from_offsets(offsets: &[u32]) -> Self {
        let mut segments: Vec<Segment> = Vec::new();
        for (frame, &offset) in offsets.iter().enumerate() {
            match segments.last_mut() {
                Some(seg) if seg.offset == offset => seg.last = frame,
                _ => segments.push(Segment {
                    first: frame,
                    last: frame,
                    offset,
                }),
            }
        }
        Self {
            segments,
            len: offsets.len(),
        }
    }

    pub fn from_trajectory(trajectory: &CropTrajectory) -> Self {
        Self::from_offsets(trajectory.offsets())
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Value the expression yields at frame `n`, as ffmpeg evaluates it.
    pub fn value_at(&self, n: usize) -> u32 {
        if n >= self.len {
            return self.segments.last().map_or(0, |s| s.offset);
        }
        self.segments
            .iter()
            .find(|s| s.first <= n && n <= s.last)
            .map_or(0, |s| s.offset)
    }

    pub fn to_ffmpeg_expr(&self) -> String {
        let mut expr = String::new();
        let mut push_term = |term: String| {
            if !expr.is_empty() {
                expr.push('+');
            }
            expr.push_str(&term);
        };

        for seg in self.segments.iter().filter(|s| s.offset != 0) {
            if seg.first == seg.last {
                push_term(format!("eq(n,{})*{}", seg.first, seg.offset));
            } else {
                push_term(format!(
                    "between(n,{},{})*{}",
                    seg.first, seg.last, seg.offset
                ));
            }
        }
        if let Some(last) = self.segments.last().filter(|s| s.offset != 0) {
            push_term(format!("gte(n,{})*{}", self.len, last.offset));
        }

        if expr.is_empty() {
            expr.push('0');
        }
        expr
    }

    /// Full `crop` filter for a crop window of `width` x `height`.
    pub fn to_crop_filter(&self, width: u32, height: u32) -> String {
        format!(
            "crop=w={width}:h={height}:x='{}':y=0",
            self.to_ffmpeg_expr()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Evaluates the generated text the way ffmpeg would for frame `n`.
    fn eval_expr(expr: &str, n: u64) -> u64 {
        expr.split('+')
            .map(|term| {
                if term == "0" {
                    return 0;
                }
                let (call, factor) = term.split_once(")*").unwrap();
                let (func, args) = call.split_once('(').unwrap();
                let args: Vec<u64> = args
                    .split(',')
                    .skip(1)
                    .map(|a| a.parse().unwrap())
                    .collect();
                let hit = match func {
                    "eq" => n == args[0],
                    "between" => args[0] <= n && n <= args[1],
                    "gte" => n >= args[0],
                    other => panic!("unexpected function {other}"),
                };
                if hit {
                    factor.parse::<u64>().unwrap()
                } else {
                    0
                }
            })
            .sum()
    }

    #[test]
    fn test_runs_collapse_into_segments() {
        let expr = CropExpression::from_offsets(&[5, 5, 5, 7, 7, 5]);
        assert_eq!(expr.segment_count(), 3);
        assert_eq!(
            expr.to_ffmpeg_expr(),
            "between(n,0,2)*5+between(n,3,4)*7+eq(n,5)*5+gte(n,6)*5"
        );
    }

    #[test]
    fn test_zero_offsets_contribute_no_terms() {
        let expr = CropExpression::from_offsets(&[0, 0, 10, 0]);
        assert_eq!(expr.to_ffmpeg_expr(), "eq(n,2)*10");
    }

    #[test]
    fn test_all_zero_is_literal_zero() {
        assert_eq!(CropExpression::from_offsets(&[0, 0, 0]).to_ffmpeg_expr(), "0");
        assert_eq!(CropExpression::from_offsets(&[]).to_ffmpeg_expr(), "0");
    }

    #[rstest]
    #[case::constant(vec![656; 100])]
    #[case::ramp((0..50).collect())]
    #[case::mixed(vec![0, 3, 3, 0, 1313, 1313, 12, 0, 0, 9])]
    fn test_value_at_reproduces_every_frame(#[case] offsets: Vec<u32>) {
        let expr = CropExpression::from_offsets(&offsets);
        let text = expr.to_ffmpeg_expr();
        for (n, &x) in offsets.iter().enumerate() {
            assert_eq!(expr.value_at(n), x, "frame {n}");
            assert_eq!(eval_expr(&text, n as u64), u64::from(x), "frame {n}");
        }
        let last = u64::from(*offsets.last().unwrap());
        assert_eq!(eval_expr(&text, offsets.len() as u64 + 5), last);
    }

    #[test]
    fn test_frames_past_end_hold_last_offset() {
        let expr = CropExpression::from_offsets(&[1, 2, 3]);
        assert_eq!(expr.value_at(3), 3);
        assert_eq!(expr.value_at(1000), 3);
    }

    #[test]
    fn test_crop_filter_quotes_expression() {
        let expr = CropExpression::from_offsets(&[656, 656]);
        assert_eq!(
            expr.to_crop_filter(607, 1080),
            "crop=w=607:h=1080:x='between(n,0,1)*656+gte(n,2)*656':y=0"
        );
    }
}
