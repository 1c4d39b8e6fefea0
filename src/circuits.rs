//! Boolean circuits (L4): adders, comparison, division.
//!
//! Everything here is expressed over [`BSharedVector`] primitives; the
//! only protocol rounds are the ANDs inside each circuit.
//!
//! Two adders are provided. The ripple-carry adder runs `W - 1` AND
//! rounds but packs carries into compressed vectors of `ceil(n / W)`
//! elements, which is asymptotically optimal bandwidth as inputs grow;
//! since we are rarely round-bound, it is the default. The Kogge-Stone
//! parallel-prefix adder runs `ceil(log2 W)` rounds at full-width
//! bandwidth for the round-bound cases.

use crate::config::AdderTopology;
use crate::element::Element;
use crate::encoded::BSharedVector;
use crate::error::{Error, Result};
use crate::operators::common::multiplex_b;

/// Boolean addition with the configured adder circuit. `carry_in` seeds
/// the carry chain; combined with a complemented operand it implements
/// subtraction.
pub fn add_boolean<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
    carry_in: bool,
) -> Result<BSharedVector<T>> {
    match a.context().adder() {
        AdderTopology::RippleCarry => ripple_carry_adder(a, b, carry_in),
        AdderTopology::KoggeStone => parallel_prefix_adder(a, b, carry_in),
    }
}

/// Vectorized boolean addition with a bit-packed ripple-carry adder.
///
/// The circuit is slightly non-traditional to hit exactly `W - 1` AND
/// rounds: the carry recurrence is `c_i = ((c_{i-1} ^ a_i) & (a_i ^ b_i))
/// ^ a_i`, one AND per bit position, evaluated over compressed vectors
/// holding one bit plane each.
pub fn ripple_carry_adder<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
    carry_in: bool,
) -> Result<BSharedVector<T>> {
    let ctx = a.context();
    let w = T::BITS;
    let compressed = a.size().div_ceil(w as usize);

    let a_xor_b = a ^ b;
    let axb_i = BSharedVector::zeroed(ctx, compressed);
    let a_i = BSharedVector::zeroed(ctx, compressed);
    let mut carry_i = BSharedVector::zeroed(ctx, compressed);
    let sum = BSharedVector::zeroed(ctx, a.size());

    if carry_in {
        carry_i.invert_inplace();
    }

    for i in 0..w {
        axb_i.pack_from(&a_xor_b, i);
        a_i.pack_from(a, i);

        sum.unpack_from(&(&axb_i ^ &carry_i), i);

        // no carry out of the last round
        if i == w - 1 {
            break;
        }

        // XORs are cheap here, unlike in hardware, so one AND per round
        // beats the canonical full adder.
        carry_i ^= &a_i;
        carry_i.and_assign(&axb_i)?;
        carry_i ^= &a_i;
    }

    Ok(sum)
}

/// Round-optimized comparison via boolean subtraction: computes only the
/// carry chain of `a - b` and returns the sign bit, i.e. `a < b`, in the
/// LSB. Same `W - 1` rounds as the adder without producing sum bits.
pub fn rca_compare<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
) -> Result<BSharedVector<T>> {
    let ctx = a.context();
    let w = T::BITS;
    let compressed = a.size().div_ceil(w as usize);

    // a + !b + 1
    let nb = !b;
    let a_xor_b = a ^ &nb;

    let axb_i = BSharedVector::zeroed(ctx, compressed);
    let a_i = BSharedVector::zeroed(ctx, compressed);
    let mut carry_i = BSharedVector::zeroed(ctx, compressed);
    let sum = BSharedVector::zeroed(ctx, a.size());

    // "+ 1" for subtraction
    carry_i.invert_inplace();

    for i in 0..w {
        axb_i.pack_from(&a_xor_b, i);

        // intermediate sum bits are never needed
        if i == w - 1 {
            break;
        }

        a_i.pack_from(a, i);
        carry_i ^= &a_i;
        carry_i.and_assign(&axb_i)?;
        carry_i ^= &a_i;
    }

    // the MSB of the difference is all we unpack
    carry_i ^= &axb_i;
    sum.unpack_from(&carry_i, w - 1);
    Ok(sum.ltz())
}

/// One Kogge-Stone combine: `(g, p) <- (gx | (px & gy), px & py)` over
/// already-shifted `(gy, py)`, rewritten to save an AND.
fn ppa_combine<T: Element>(
    g_x: &BSharedVector<T>,
    p_x: &BSharedVector<T>,
    g_y: &BSharedVector<T>,
    p_y: &BSharedVector<T>,
) -> Result<(BSharedVector<T>, BSharedVector<T>)> {
    let p_out = p_y.and(p_x)?;
    let g_y = g_y.and(p_x)?;
    let gpg = g_x.and(&g_y)?;
    // equivalent to g' := gx ^ gx.px.gy ^ gy.px
    let g_out = &(g_x ^ &g_y) ^ &gpg;
    Ok((g_out, p_out))
}

/// Vectorized boolean addition with a Kogge-Stone parallel-prefix adder:
/// `ceil(log2 W)` AND rounds over full-width generate/propagate planes.
pub fn parallel_prefix_adder<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
    carry_in: bool,
) -> Result<BSharedVector<T>> {
    let mut p = a ^ b;
    let mut g = a.and(b)?;

    if carry_in {
        // Fold the carry into the LSB plane: p := p ^ 1, g ^= old LSB of p.
        let lsb = p.deepcopy();
        lsb.mask(T::ONE);
        p = p.xor_public(T::ONE);
        g ^= &lsb;
    }

    let propagate = p.deepcopy();

    for i in 0..T::LOG_BITS {
        let g_shift = &g << (1 << i);
        let p_shift = &p << (1 << i);
        (g, p) = ppa_combine(&g, &p, &g_shift, &p_shift)?;
    }

    Ok(&propagate ^ &(&g << 1))
}

/// Same-prefix circuit: bit `j` of the result is 1 iff `a` and `b` agree
/// on all bits from the MSB down to `j`. A Kogge-Stone prefix-OR over
/// `log W` AND rounds; the LSB therefore holds full equality.
pub fn bit_same<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
) -> Result<BSharedVector<T>> {
    let same = a ^ b;
    same.invert_inplace();
    for level in 0..T::LOG_BITS {
        let shifted = &same >> (1 << level);
        same.and_assign(&shifted)?;
    }
    Ok(same)
}

/// Fused equality + greater-than comparison. Sort routines consume both
/// results, and greater-than needs the same-prefix circuit anyway.
///
/// The same-prefix edge (the MSB where the inputs first differ) acts as a
/// distributed point function: AND-ing it with `a` and XOR-reducing
/// isolates "`a` has a 1 at the first differing bit", which is unsigned
/// greater-than; a packed sign-bit correction fixes up signed inputs.
pub fn compare_eq_gt<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
) -> Result<(BSharedVector<T>, BSharedVector<T>)> {
    debug_assert_eq!(a.size(), b.size(), "compare size mismatch");
    let ctx = a.context();
    let w = T::BITS;
    let compressed = a.size().div_ceil(w as usize);

    let eq = bit_same(a, b)?;

    // ((eq >> 1) ^ eq) & a, XOR-reduced to one bit
    let mut gt = &(&eq >> 1) ^ &eq;
    gt.and_assign(a)?;
    gt = gt.bit_xor_reduce();

    // Signed correction on packed sign bits:
    //   r := s1 ^ ((s1 ^ s2) | (s2 ^ r))
    let s1 = BSharedVector::zeroed(ctx, compressed);
    let s2 = BSharedVector::zeroed(ctx, compressed);
    let r = BSharedVector::zeroed(ctx, compressed);
    s1.pack_from(a, w - 1);
    s2.pack_from(b, w - 1);
    r.pack_from(&gt, 0);

    let r = &r ^ &s2;
    let s2 = &s2 ^ &s1;
    s2.or_assign(&r)?;
    let s1 = &s1 ^ &s2;

    gt.unpack_from(&s1, 0);

    eq.mask(T::ONE);
    gt.mask(T::ONE);
    Ok((eq, gt))
}

/// Private division with the non-restoring binary algorithm, computed
/// over the double-width type: `W` adder invocations plus a final
/// correction.
pub fn divide_boolean<T: Element>(
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
) -> Result<BSharedVector<T>> {
    if !T::SUPPORTS_WIDE {
        return Err(Error::precondition(
            "private division needs a double-width type; not available at this width",
        ));
    }
    let w = T::BITS;

    let mut r: BSharedVector<T::Wide> = a.cast();
    let mut d: BSharedVector<T::Wide> = b.cast();
    d <<= w;

    let mut q = BSharedVector::<T::Wide>::zeroed(a.context(), a.size());
    let neg_d = d.neg()?;

    for i in (0..w).rev() {
        // c := r >= 0; that bit is q(i)
        let c = r.ltz().not_lsb();
        q ^= &(&c << i);

        // r := 2r - d if r >= 0, else 2r + d
        r = (&r << 1).add(&multiplex_b(&c, &d, &neg_d)?)?;
    }

    // 0 bits of q currently encode -1: q -= ~q. Then adjust parity by the
    // sign of the final remainder.
    let correction = (!&q).add(&r.ltz())?;
    q = q.sub(&correction)?;

    Ok(q.cast::<T>())
}
