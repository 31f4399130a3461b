use rust_htslib::bam::record::{Cigar, CigarString};

/// One run of an alignment, in the CIGAR alphabet.
///
/// `M` and `=` both map onto `Match`; `X` is kept distinct because a
/// mismatching base must not satisfy match-only queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOp {
    Start,
    Match,
    Mismatch,
    Insertion,
    Deletion,
    SoftClip,
    HardClip,
}

impl AlignOp {
    /// Whether the operation advances the read-sequence coordinate.
    ///
    /// Hard clips advance it too: anchors are expressed in the coordinates
    /// of the full read, and the resolver rebases them when the stored
    /// sequence lacks the clipped prefix.
    pub fn consumes_seq(self) -> bool {
        matches!(
            self,
            AlignOp::Match
                | AlignOp::Mismatch
                | AlignOp::Insertion
                | AlignOp::SoftClip
                | AlignOp::HardClip
        )
    }

    /// Whether the operation advances the reference coordinate.
    pub fn consumes_ref(self) -> bool {
        matches!(self, AlignOp::Match | AlignOp::Mismatch | AlignOp::Deletion)
    }

    pub fn is_match(self) -> bool {
        self == AlignOp::Match
    }
}

/// Marks the end of one operation run: the read-sequence and reference
/// coordinates of the run's last position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignAnchor {
    pub seq_pos: i64,
    pub ref_pos: i64,
    pub op: AlignOp,
}

/// An ordered anchor sequence bracketing the operation runs of one read's
/// alignment. The first anchor is a `Start` sentinel placed just before
/// the first aligned position in both coordinate systems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub anchors: Vec<AlignAnchor>,
}

impl Alignment {
    /// Builds the anchor sequence from a CIGAR and the 1-based reference
    /// position of the first aligned base.
    pub fn from_cigar(cigar: &CigarString, left_pos: i64) -> Alignment {
        let mut anchors = Vec::with_capacity(cigar.len() + 1);
        let mut seq_pos = 0i64;
        let mut ref_pos = left_pos - 1;
        anchors.push(AlignAnchor {
            seq_pos,
            ref_pos,
            op: AlignOp::Start,
        });

        for op in cigar.iter() {
            let (align_op, len) = match *op {
                Cigar::Match(n) | Cigar::Equal(n) => (AlignOp::Match, n),
                Cigar::Diff(n) => (AlignOp::Mismatch, n),
                Cigar::Ins(n) => (AlignOp::Insertion, n),
                Cigar::Del(n) | Cigar::RefSkip(n) => (AlignOp::Deletion, n),
                Cigar::SoftClip(n) => (AlignOp::SoftClip, n),
                Cigar::HardClip(n) => (AlignOp::HardClip, n),
                Cigar::Pad(_) => continue,
            };
            if align_op.consumes_seq() {
                seq_pos += len as i64;
            }
            if align_op.consumes_ref() {
                ref_pos += len as i64;
            }
            anchors.push(AlignAnchor {
                seq_pos,
                ref_pos,
                op: align_op,
            });
        }

        Alignment { anchors }
    }

    /// Reference position of the first aligned base, or `None` for an
    /// alignment with no reference-consuming run.
    pub fn first_ref_pos(&self) -> Option<i64> {
        self.anchors
            .iter()
            .any(|a| a.op.consumes_ref())
            .then(|| self.anchors[0].ref_pos + 1)
    }

    /// Reference position of the last aligned base.
    pub fn last_ref_pos(&self) -> Option<i64> {
        self.anchors
            .iter()
            .any(|a| a.op.consumes_ref())
            .then(|| self.anchors[self.anchors.len() - 1].ref_pos)
    }

    /// Length of a leading hard-clip run in read-sequence coordinates.
    pub fn leading_hard_clip(&self) -> i64 {
        match self.anchors.get(1) {
            Some(anchor) if anchor.op == AlignOp::HardClip => {
                anchor.seq_pos - self.anchors[0].seq_pos
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cigar(encoding: &str) -> CigarString {
        CigarString::try_from(encoding).unwrap()
    }

    #[test]
    fn anchors_bracket_operation_runs() {
        let aln = Alignment::from_cigar(&cigar("3S5M2D4M"), 100);
        let got: Vec<(i64, i64, AlignOp)> = aln
            .anchors
            .iter()
            .map(|a| (a.seq_pos, a.ref_pos, a.op))
            .collect();
        assert_eq!(
            got,
            vec![
                (0, 99, AlignOp::Start),
                (3, 99, AlignOp::SoftClip),
                (8, 104, AlignOp::Match),
                (8, 106, AlignOp::Deletion),
                (12, 110, AlignOp::Match),
            ]
        );
    }

    #[test]
    fn hard_clip_advances_sequence_coordinate() {
        let aln = Alignment::from_cigar(&cigar("10H5M"), 50);
        assert_eq!(aln.leading_hard_clip(), 10);
        assert_eq!(aln.anchors[1].seq_pos, 10);
        assert_eq!(aln.anchors[2].seq_pos, 15);
    }

    #[test]
    fn ref_span_ignores_clips_and_insertions() {
        let aln = Alignment::from_cigar(&cigar("2S4M1I4M3S"), 10);
        assert_eq!(aln.first_ref_pos(), Some(10));
        assert_eq!(aln.last_ref_pos(), Some(17));
    }
}
