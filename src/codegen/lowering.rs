//! Fixed tape micro-programs for intrinsics and array access.
//!
//! Layout on entry: the pointer is on the first free cell (offset 0), the top
//! of the stack is at -1, the next value at -2. Every cell from 0 rightwards
//! is zero on entry and again on exit. On exit the pointer is on the new first
//! free cell, so the cursor's final position equals the depth change.

use crate::codegen::cursor::Cursor;
use crate::lang::{ArraySpec, Intrinsic};

/// A byte index can only address this many slots.
pub const INDEXABLE_SLOTS: usize = 256;

pub fn intrinsic(op: Intrinsic) -> String {
    let mut c = Cursor::new();

    match op {
        // [.., x] -> [..]
        Intrinsic::Pop => {
            c.go(-1).clear();
        }

        // [.., x] -> [.., x, x]
        Intrinsic::Dup => {
            c.drain_into(-1, &[0, 1]).drain_into(1, &[-1]).go(1);
        }

        // [.., y, x] -> [.., y, x, y]
        Intrinsic::Over => {
            c.drain_into(-2, &[0, 1]).drain_into(1, &[-2]).go(1);
        }

        // [.., y, x] -> [.., x, y], using cell 0 as a temporary
        Intrinsic::Swap => {
            c.drain_into(-2, &[0]).drain_into(-1, &[-2]).drain_into(0, &[-1]);
        }

        Intrinsic::Add => {
            c.drain_into(-1, &[-2]).go(-1);
        }

        Intrinsic::Sub => {
            c.drain_sub(-1, -2).go(-1);
        }

        // y-x into y, then turn "y is nonzero" into a 0/1 flag in x.
        Intrinsic::Eq | Intrinsic::Neq => {
            c.drain_sub(-1, -2);
            c.go(-2).open().clear().go(-1).inc(1).close();
            if op == Intrinsic::Eq {
                c.inc(1).drain_sub(-1, -2);
            } else {
                c.drain_into(-1, &[-2]);
            }
            c.go(-1);
        }

        // gt: y > x, lt: x > y. `a` and `b` count down together and the
        // result is raised once if `b` hits zero while `a` is still running.
        // Exact for the whole byte range.
        Intrinsic::Gt | Intrinsic::Lt => {
            let (a, b) = if op == Intrinsic::Gt { (-2, -1) } else { (-1, -2) };
            let (zero_flag, saved, result) = (0, 1, 2);

            c.go(a).open();
            c.go(zero_flag).inc(1);
            c.go(b)
                .open()
                .dec(1)
                .go(zero_flag)
                .clear()
                .go(saved)
                .inc(1)
                .close();
            c.drain_into(zero_flag, &[result]);
            c.drain_into(saved, &[b]);
            c.go(b).dec(1).go(a).dec(1);
            c.close();

            // a is zero now, b holds wrapped garbage
            c.go(b).clear();
            c.drain_into(result, &[-2]).go(-1);
        }

        Intrinsic::Or => {
            for operand in [-2, -1] {
                c.go(operand).open().clear().go(0).clear().inc(1).close();
            }
            c.drain_into(0, &[-2]).go(-1);
        }

        Intrinsic::And => {
            c.go(-2).open().clear();
            c.go(-1).open().clear().go(0).inc(1).close();
            c.close();
            c.go(-1).clear();
            c.drain_into(0, &[-2]).go(-1);
        }

        Intrinsic::Print => {
            c.go(-1).output().clear();
        }

        Intrinsic::DbgPrint => {
            c.go(-1).debug_output().clear();
        }
    }

    debug_assert_eq!(c.position(), {
        let (pops, pushes) = crate::codegen::stack_effect::effect(op);
        pushes as isize - pops as isize
    });
    c.finish()
}

/// Unrolls over the slots of `spec`, running `access` on the slot whose
/// position equals the value in `index`. `index` counts down by one per slot.
///
/// `flag` and `temp` must be free scratch cells; `index` is left at zero.
fn for_matching_slot(
    c: &mut Cursor,
    spec: &ArraySpec,
    pointer: usize,
    index: isize,
    flag: isize,
    temp: isize,
    mut access: impl FnMut(&mut Cursor, isize),
) {
    for slot in 0..spec.size.min(INDEXABLE_SLOTS) {
        let cell = (spec.offset + slot) as isize - pointer as isize;

        // flag = (index == 0), index preserved through temp
        c.go(flag).inc(1);
        c.go(index)
            .open()
            .dec(1)
            .go(temp)
            .inc(1)
            .go(flag)
            .clear()
            .close();
        c.drain_into(temp, &[index]);

        c.go(flag).open().dec(1);
        access(c, cell);
        c.close();

        c.go(index).dec(1);
    }
    c.go(index).clear();
}

/// `( index -- value )` for the array at `spec`, with the pointer at absolute
/// tape position `pointer`.
///
/// Indices past the end read as 0.
pub fn array_get(spec: &ArraySpec, pointer: usize) -> String {
    let (index, flag, temp) = (0, 1, 2);
    let mut c = Cursor::new();

    c.drain_into(-1, &[index]);
    for_matching_slot(&mut c, spec, pointer, index, flag, temp, |c, cell| {
        c.drain_into(cell, &[-1, temp]).drain_into(temp, &[cell]);
    });
    c.go(0);

    c.finish()
}

/// `( index value -- )` for the array at `spec`, with the pointer at absolute
/// tape position `pointer`.
///
/// Writes past the end are dropped.
pub fn array_set(spec: &ArraySpec, pointer: usize) -> String {
    let (index, value, flag, temp) = (-2, -1, 0, 1);
    let mut c = Cursor::new();

    for_matching_slot(&mut c, spec, pointer, index, flag, temp, |c, cell| {
        c.go(cell).clear();
        c.drain_into(value, &[cell, temp]).drain_into(temp, &[value]);
    });
    c.go(value).clear().go(-2);

    c.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_patterns() {
        assert_eq!(intrinsic(Intrinsic::Pop), "<[-]");
        assert_eq!(intrinsic(Intrinsic::Dup), "<[->+>+<<]>>[-<<+>>]");
        assert_eq!(intrinsic(Intrinsic::Add), "<[-<+>]");
        assert_eq!(intrinsic(Intrinsic::Sub), "<[-<->]");
        assert_eq!(intrinsic(Intrinsic::Swap), "<<[->>+<<]>[-<+>]>[-<+>]");
        assert_eq!(intrinsic(Intrinsic::Print), "<.[-]");
        assert_eq!(intrinsic(Intrinsic::DbgPrint), "<?[-]");
    }

    #[test]
    fn test_patterns_are_balanced() {
        use Intrinsic::*;
        for op in [
            Pop, Dup, Over, Swap, Add, Sub, Eq, Neq, Gt, Lt, Or, And, Print, DbgPrint,
        ] {
            let code = intrinsic(op);
            let opens = code.matches('[').count();
            let closes = code.matches(']').count();
            assert_eq!(opens, closes, "{}", op);
        }
    }

    #[test]
    fn test_array_access_unrolls_per_slot() {
        let spec = ArraySpec { size: 3, offset: 0 };
        let one = ArraySpec { size: 1, offset: 0 };
        let get3 = array_get(&spec, 4);
        let get1 = array_get(&one, 4);
        assert!(get3.len() > get1.len());
        assert_eq!(get1.matches('[').count(), get1.matches(']').count());
    }

    #[test]
    fn test_unroll_is_bounded_by_index_range() {
        let huge = ArraySpec {
            size: 1000,
            offset: 0,
        };
        let capped = ArraySpec {
            size: INDEXABLE_SLOTS,
            offset: 0,
        };
        assert_eq!(array_set(&huge, 1000).len(), array_set(&capped, 1000).len());
    }
}
