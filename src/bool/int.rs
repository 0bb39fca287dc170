//! Unsigned integers as bit-vector circuits
//!
//! Bits are stored in little-endian order (LSB first) and zero-extended on
//! access, so integers of different widths compare and add directly.

use super::{BooleanFactory, FALSE, TRUE};

/// Unsigned integer whose bits are circuit literals
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Int {
    bits: Vec<i32>,
}

/// Number of bits needed to represent `value`
pub fn bits_for(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()).max(1) as usize
}

impl Int {
    /// Creates an Int from its bits, LSB first
    pub fn new(bits: Vec<i32>) -> Self {
        assert!(!bits.is_empty(), "Int must have at least one bit");
        Self { bits }
    }

    /// Constant integer using the minimal number of bits
    pub fn constant(value: u64) -> Self {
        let width = bits_for(value);
        let bits = (0..width)
            .map(|i| if (value >> i) & 1 == 1 { TRUE } else { FALSE })
            .collect();
        Self { bits }
    }

    /// Integer of `width` fresh variables
    pub fn variable(width: usize, factory: &mut BooleanFactory) -> Self {
        Self::new((0..width).map(|_| factory.variable()).collect())
    }

    /// Returns the number of bits
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Returns the bit at `i` (LSB = 0), FALSE beyond the width
    pub fn bit(&self, i: usize) -> i32 {
        self.bits.get(i).copied().unwrap_or(FALSE)
    }

    /// All bits, LSB first
    pub fn bits(&self) -> &[i32] {
        &self.bits
    }

    /// If every bit is constant, returns the value
    pub fn value(&self) -> Option<u64> {
        self.bits.iter().enumerate().try_fold(0u64, |acc, (i, &b)| {
            BooleanFactory::constant_value(b).map(|set| if set { acc | (1 << i) } else { acc })
        })
    }

    /// Decodes the value under a variable assignment
    pub fn decode(&self, value_of: impl Fn(i32) -> bool) -> u64 {
        self.bits.iter().enumerate().fold(0u64, |acc, (i, &b)| {
            let set = match BooleanFactory::constant_value(b) {
                Some(c) => c,
                None if b > 0 => value_of(b),
                None => !value_of(-b),
            };
            if set { acc | (1 << i) } else { acc }
        })
    }

    /// Ripple-carry addition; the result is one bit wider than the operands
    pub fn plus(&self, other: &Int, factory: &mut BooleanFactory) -> Int {
        let width = self.width().max(other.width());
        let mut bits = Vec::with_capacity(width + 1);
        let mut carry = FALSE;
        for i in 0..width {
            let (sum, next) = factory.full_adder(self.bit(i), other.bit(i), carry);
            bits.push(sum);
            carry = next;
        }
        bits.push(carry);
        Int::new(bits)
    }

    /// Sum of several integers (zero for an empty input)
    pub fn sum<'a>(ints: impl IntoIterator<Item = &'a Int>, factory: &mut BooleanFactory) -> Int {
        ints.into_iter()
            .fold(Int::constant(0), |acc, x| acc.plus(x, factory))
    }

    /// Equality comparator
    pub fn eq(&self, other: &Int, factory: &mut BooleanFactory) -> i32 {
        let width = self.width().max(other.width());
        let mut all = Vec::with_capacity(width);
        for i in 0..width {
            let same = factory.iff(self.bit(i), other.bit(i));
            if same == FALSE {
                return FALSE;
            }
            all.push(same);
        }
        factory.and_multi(all)
    }

    /// Unsigned less-than-or-equal comparator, rippling from LSB to MSB
    pub fn lte(&self, other: &Int, factory: &mut BooleanFactory) -> i32 {
        let width = self.width().max(other.width());
        // le holds for the bits below i
        let mut le = TRUE;
        for i in 0..width {
            let a = self.bit(i);
            let b = other.bit(i);
            let strictly_less = factory.and(-a, b);
            let same = factory.iff(a, b);
            let carried = factory.and(same, le);
            le = factory.or(strictly_less, carried);
        }
        le
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rustsat_adapter::RustSatAdapter;
    use crate::engine::SATSolver;
    use rustsat_batsat::BasicSolver;

    #[test]
    fn constant_round_trip() {
        for v in [0u64, 1, 5, 100, 255] {
            assert_eq!(Int::constant(v).value(), Some(v));
        }
        assert_eq!(Int::constant(100).width(), 7);
        assert_eq!(bits_for(0), 1);
    }

    #[test]
    fn constant_arithmetic_folds() {
        let mut f = BooleanFactory::new();
        let sum = Int::constant(37).plus(&Int::constant(63), &mut f);
        assert_eq!(sum.value(), Some(100));
        assert_eq!(Int::constant(3).lte(&Int::constant(4), &mut f), TRUE);
        assert_eq!(Int::constant(5).lte(&Int::constant(4), &mut f), FALSE);
        assert_eq!(Int::constant(4).eq(&Int::constant(4), &mut f), TRUE);
        // folding emits nothing beyond the TRUE unit clause
        assert_eq!(f.num_clauses(), 1);
    }

    #[test]
    fn symbolic_sum_matches_target() {
        // x + y == 9 with x <= 3 forces y >= 6
        let mut f = BooleanFactory::new();
        let x = Int::variable(3, &mut f);
        let y = Int::variable(3, &mut f);
        let sum = x.plus(&y, &mut f);
        let eq = sum.eq(&Int::constant(9), &mut f);
        f.assert(eq);
        let le = x.lte(&Int::constant(3), &mut f);
        f.assert(le);

        let cnf = f.into_cnf();
        let mut solver = RustSatAdapter::new(BasicSolver::default());
        solver.add_variables(cnf.num_variables);
        for clause in &cnf.clauses {
            solver.add_clause(clause);
        }
        assert_eq!(solver.solve(), Some(true));
        let xv = x.decode(|v| solver.value_of(v as u32));
        let yv = y.decode(|v| solver.value_of(v as u32));
        assert_eq!(xv + yv, 9);
        assert!(xv <= 3);
        assert!(yv >= 6);
    }
}
