use tracing::info;

use crate::ir::{Line, Quad};

/// Drop every `JUMP` that targets the line right after it and renumber the
/// remaining jump targets.
///
/// A target pointing at a dropped jump ends up on the instruction that
/// slides into its place, which is exactly where the dropped jump went.
pub fn peephole(code: Vec<Quad<Line>>) -> Vec<Quad<Line>> {
    let removed: Vec<Line> = code
        .iter()
        .enumerate()
        .filter_map(|(idx, quad)| match quad {
            Quad::Jump(target) if *target == idx + 2 => Some(idx + 1),
            _ => None,
        })
        .collect();
    if removed.is_empty() {
        return code;
    }
    info!(removed = removed.len(), "dropping jumps to the next line");

    let shift = |target: Line| target - removed.iter().filter(|line| **line < target).count();
    code.into_iter()
        .enumerate()
        .filter(|(idx, _)| removed.binary_search(&(idx + 1)).is_err())
        .map(|(_, quad)| match quad {
            Quad::Jump(target) => Quad::Jump(shift(target)),
            Quad::Jmpz { target, cond } => Quad::Jmpz {
                target: shift(target),
                cond,
            },
            quad => quad,
        })
        .collect()
}
