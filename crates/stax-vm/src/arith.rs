//! Arithmetic dispatch over the numeric tower.
//!
//! Commands pop their operands and dispatch on the operand kinds:
//! integers stay exact (widening to bignums, falling into fractions on
//! inexact division), fractions promote to decimals when mixed with
//! them, and anything symbolic folds the operation back into an
//! expression instead of erroring. Comparisons return the canonical
//! integers 0 and 1.

use std::cmp::Ordering;

use stax_core::{object, Error, Result, Tag};
use stax_runtime::ObjectId;

use stax_arith::{bignum, decimal, fraction, Decimal, Int, Rational};

use crate::vm::Vm;

/// A numeric operand lifted out of the heap.
#[derive(Clone, Debug)]
enum Num {
    Int(Int),
    Rat(Rational),
    Dec(Decimal),
}

fn read_num(vm: &Vm, id: ObjectId) -> Result<Option<Num>> {
    let tag = vm.rt.tag(id);
    if tag.is_integer() || tag.is_based() {
        return Ok(Some(Num::Int(bignum::read_int(&vm.rt, id)?)));
    }
    if tag.is_fraction() {
        return Ok(Some(Num::Rat(fraction::read_rational(&vm.rt, id)?)));
    }
    if tag == Tag::Decimal {
        return Ok(Some(Num::Dec(decimal::read_decimal(&vm.rt, id)?)));
    }
    Ok(None)
}

fn is_symbolic(tag: Tag) -> bool {
    matches!(tag, Tag::Symbol | Tag::Expression | Tag::Funcall)
}

fn push_num(vm: &mut Vm, value: Num) -> Result<()> {
    let id = match value {
        Num::Int(i) => bignum::make_int(&mut vm.rt, i)?,
        Num::Rat(r) => fraction::make_rational(&mut vm.rt, r)?,
        Num::Dec(d) => decimal::make_decimal(&mut vm.rt, d)?,
    };
    vm.rt.push(id);
    Ok(())
}

fn as_rational(value: &Num) -> Option<Rational> {
    match value {
        Num::Int(i) if !i.based => Some(Rational::from_int(i)),
        Num::Rat(r) => Some(r.clone()),
        _ => None,
    }
}

fn as_decimal(value: &Num) -> Decimal {
    match value {
        Num::Int(i) => Decimal::from_int(i),
        Num::Rat(r) => {
            let num = Decimal::from_int(&Int::new(r.neg, false, r.num.clone()));
            let den = Decimal::from_int(&Int::new(false, false, r.den.clone()));
            decimal::div(&num, &den).unwrap_or_else(|_| Decimal::zero())
        }
        Num::Dec(d) => *d,
    }
}

// ----------------------------------------------------------------------------
//   Binary operations
// ----------------------------------------------------------------------------

/// Pop `x` then `y` and push `y <op> x`.
pub fn binary(vm: &mut Vm, op: Tag) -> Result<()> {
    let x = vm.rt.pop()?;
    let y = match vm.rt.pop() {
        Ok(id) => id,
        Err(e) => {
            vm.rt.push(x);
            return Err(e);
        }
    };

    // Symbolic operands fold the operation into an expression.
    if is_symbolic(vm.rt.tag(x)) || is_symbolic(vm.rt.tag(y)) {
        return symbolic_binary(vm, op, y, x);
    }
    if is_complex(vm.rt.tag(x)) || is_complex(vm.rt.tag(y)) {
        match complex_binary(vm, op, y, x) {
            Ok(()) => return Ok(()),
            Err(e) => {
                vm.rt.push(y);
                vm.rt.push(x);
                return Err(e);
            }
        }
    }

    let (Some(yv), Some(xv)) = (read_num(vm, y)?, read_num(vm, x)?) else {
        vm.rt.push(y);
        vm.rt.push(x);
        return Err(Error::TypeMismatch);
    };
    match numeric_binary(vm, op, &yv, &xv) {
        Ok(result) => push_num(vm, result),
        Err(e) => {
            // Leave the operands where they were.
            vm.rt.push(y);
            vm.rt.push(x);
            Err(e)
        }
    }
}

fn numeric_binary(vm: &mut Vm, op: Tag, y: &Num, x: &Num) -> Result<Num> {
    // Any decimal operand promotes the whole operation.
    if matches!(y, Num::Dec(_)) || matches!(x, Num::Dec(_)) {
        let yd = as_decimal(y);
        let xd = as_decimal(x);
        let result = match op {
            Tag::Add => decimal::add(&yd, &xd),
            Tag::Sub => decimal::sub(&yd, &xd),
            Tag::Mul => decimal::mul(&yd, &xd),
            Tag::Div => decimal::div(&yd, &xd)?,
            Tag::Pow => crate::transcend::decimal_pow(&yd, &xd)?,
            Tag::Mod | Tag::Rem => return Err(Error::TypeMismatch),
            _ => return Err(Error::TypeMismatch),
        };
        return Ok(Num::Dec(result));
    }

    match (y, x) {
        (Num::Int(yi), Num::Int(xi)) => int_binary(vm, op, yi, xi),
        _ => {
            let yr = as_rational(y).ok_or(Error::TypeMismatch)?;
            let xr = as_rational(x).ok_or(Error::TypeMismatch)?;
            let result = match op {
                Tag::Add => fraction::add_sub(&yr, &xr, false)?,
                Tag::Sub => fraction::add_sub(&yr, &xr, true)?,
                Tag::Mul => fraction::mul(&yr, &xr)?,
                Tag::Div => fraction::div(&yr, &xr)?,
                Tag::Pow => {
                    if !xr.is_integral() {
                        // Fractional exponents go through decimals.
                        let result = crate::transcend::decimal_pow(
                            &as_decimal(y),
                            &as_decimal(x),
                        )?;
                        return Ok(Num::Dec(result));
                    }
                    let exponent = Int::new(xr.neg, false, xr.num.clone());
                    fraction::pow(&yr, &exponent, &vm.settings)?
                }
                _ => return Err(Error::TypeMismatch),
            };
            Ok(Num::Rat(result))
        }
    }
}

fn int_binary(vm: &Vm, op: Tag, y: &Int, x: &Int) -> Result<Num> {
    let settings = &vm.settings;
    let result = match op {
        Tag::Add => bignum::add_sub(y, x, false, settings),
        Tag::Sub => bignum::add_sub(y, x, true, settings),
        Tag::Mul => bignum::mul(y, x, settings)?,
        Tag::Div => {
            if y.based || x.based {
                bignum::quorem(y, x, settings)?.0
            } else {
                // Exact division: integers divide into fractions.
                let result = fraction::div(&Rational::from_int(y), &Rational::from_int(x))?;
                return Ok(Num::Rat(result));
            }
        }
        Tag::Mod => bignum::modulo(y, x, settings)?,
        Tag::Rem => bignum::quorem(y, x, settings)?.1,
        Tag::Pow => {
            if x.neg {
                let result =
                    fraction::pow(&Rational::from_int(y), x, settings)?;
                return Ok(Num::Rat(result));
            }
            bignum::pow(y, x, settings)?
        }
        _ => return Err(Error::TypeMismatch),
    };
    Ok(Num::Int(result))
}

// ----------------------------------------------------------------------------
//   Complex numbers (rectangular arithmetic)
// ----------------------------------------------------------------------------

fn is_complex(tag: Tag) -> bool {
    matches!(tag, Tag::Rectangular | Tag::Polar)
}

/// Components of a complex operand; plain numerics lift to `(x, 0)`.
/// Polar pairs convert to rectangular through the decimal adapter, with
/// the angle in radians.
fn read_complex(vm: &mut Vm, id: ObjectId) -> Result<(Num, Num)> {
    let tag = vm.rt.tag(id);
    if !is_complex(tag) {
        let value = read_num(vm, id)?.ok_or(Error::TypeMismatch)?;
        return Ok((value, Num::Int(Int::zero())));
    }
    let bytes = vm.rt.object_vec(id);
    let (first, second) = object::pair(&bytes)?;
    let first_id = vm.rt.adopt(first)?;
    // The second adopt may collect; keep the first component rooted.
    let mark = vm.rt.protect(first_id);
    let second_id = match vm.rt.adopt(second) {
        Ok(id) => id,
        Err(e) => {
            vm.rt.unprotect_to(mark);
            return Err(e);
        }
    };
    let a = read_num(vm, first_id);
    let b = read_num(vm, second_id);
    vm.rt.unprotect_to(mark);
    let a = a?.ok_or(Error::TypeMismatch)?;
    let b = b?.ok_or(Error::TypeMismatch)?;
    if tag == Tag::Rectangular {
        return Ok((a, b));
    }
    let radius = as_decimal(&a);
    let angle = crate::transcend::to_f64(&as_decimal(&b));
    let re = decimal::mul(&radius, &crate::transcend::from_f64(angle.cos())?);
    let im = decimal::mul(&radius, &crate::transcend::from_f64(angle.sin())?);
    Ok((Num::Dec(re), Num::Dec(im)))
}

fn make_complex(vm: &mut Vm, re: Num, im: Num) -> Result<()> {
    let re_id = match re {
        Num::Int(i) => bignum::make_int(&mut vm.rt, i)?,
        Num::Rat(r) => fraction::make_rational(&mut vm.rt, r)?,
        Num::Dec(d) => decimal::make_decimal(&mut vm.rt, d)?,
    };
    let mark = vm.rt.protect(re_id);
    let im_id = match im {
        Num::Int(i) => bignum::make_int(&mut vm.rt, i),
        Num::Rat(r) => fraction::make_rational(&mut vm.rt, r),
        Num::Dec(d) => decimal::make_decimal(&mut vm.rt, d),
    };
    let im_id = match im_id {
        Ok(id) => id,
        Err(e) => {
            vm.rt.unprotect_to(mark);
            return Err(e);
        }
    };
    let pair = vm.rt.make_pair(Tag::Rectangular, re_id, im_id);
    vm.rt.unprotect_to(mark);
    vm.rt.push(pair?);
    Ok(())
}

fn complex_binary(vm: &mut Vm, op: Tag, y: ObjectId, x: ObjectId) -> Result<()> {
    let (a, b) = read_complex(vm, y)?;
    let (c, d) = read_complex(vm, x)?;
    let (re, im) = match op {
        Tag::Add => (
            numeric_binary(vm, Tag::Add, &a, &c)?,
            numeric_binary(vm, Tag::Add, &b, &d)?,
        ),
        Tag::Sub => (
            numeric_binary(vm, Tag::Sub, &a, &c)?,
            numeric_binary(vm, Tag::Sub, &b, &d)?,
        ),
        Tag::Mul => complex_mul(vm, (&a, &b), (&c, &d))?,
        Tag::Div => {
            // (a+bi)/(c+di) = ((a+bi)(c-di)) / (c²+d²)
            let cc = numeric_binary(vm, Tag::Mul, &c, &c)?;
            let dd = numeric_binary(vm, Tag::Mul, &d, &d)?;
            let norm = numeric_binary(vm, Tag::Add, &cc, &dd)?;
            if numeric_is_zero(&norm) {
                return Err(Error::ZeroDivide);
            }
            let neg_d = numeric_unary(vm, Tag::Neg, &d)?;
            let (num_re, num_im) = complex_mul(vm, (&a, &b), (&c, &neg_d))?;
            (
                numeric_binary(vm, Tag::Div, &num_re, &norm)?,
                numeric_binary(vm, Tag::Div, &num_im, &norm)?,
            )
        }
        _ => return Err(Error::TypeMismatch),
    };
    if numeric_is_zero(&im) {
        let id = match re {
            Num::Int(i) => bignum::make_int(&mut vm.rt, i)?,
            Num::Rat(r) => fraction::make_rational(&mut vm.rt, r)?,
            Num::Dec(d) => decimal::make_decimal(&mut vm.rt, d)?,
        };
        vm.rt.push(id);
        return Ok(());
    }
    make_complex(vm, re, im)
}

fn complex_mul(vm: &mut Vm, y: (&Num, &Num), x: (&Num, &Num)) -> Result<(Num, Num)> {
    let (a, b) = y;
    let (c, d) = x;
    let ac = numeric_binary(vm, Tag::Mul, a, c)?;
    let bd = numeric_binary(vm, Tag::Mul, b, d)?;
    let ad = numeric_binary(vm, Tag::Mul, a, d)?;
    let bc = numeric_binary(vm, Tag::Mul, b, c)?;
    Ok((
        numeric_binary(vm, Tag::Sub, &ac, &bd)?,
        numeric_binary(vm, Tag::Add, &ad, &bc)?,
    ))
}

fn numeric_is_zero(value: &Num) -> bool {
    match value {
        Num::Int(i) => i.is_zero(),
        Num::Rat(r) => r.is_zero(),
        Num::Dec(d) => d.is_zero(),
    }
}

fn symbolic_binary(vm: &mut Vm, op: Tag, y: ObjectId, x: ObjectId) -> Result<()> {
    let ybytes = vm.rt.object_vec(y);
    let xbytes = vm.rt.object_vec(x);
    let ybody = stax_symbolic::expr::quoted(&ybytes)?;
    let xbody = stax_symbolic::expr::quoted(&xbytes)?;
    let body = stax_symbolic::expr::binary(op, &ybody, &xbody);
    let id = stax_symbolic::make_expression(&mut vm.rt, &body)?;
    vm.rt.push(id);
    Ok(())
}

// ----------------------------------------------------------------------------
//   Comparisons
// ----------------------------------------------------------------------------

/// Pop `x` then `y`, push 1 when `y <op> x` holds, else 0.
pub fn compare(vm: &mut Vm, op: Tag) -> Result<()> {
    let x = vm.rt.pop()?;
    let y = match vm.rt.pop() {
        Ok(id) => id,
        Err(e) => {
            vm.rt.push(x);
            return Err(e);
        }
    };
    if is_symbolic(vm.rt.tag(x)) || is_symbolic(vm.rt.tag(y)) {
        return symbolic_binary(vm, op, y, x);
    }

    let ordering = match (read_num(vm, y)?, read_num(vm, x)?) {
        (Some(yv), Some(xv)) => order(&yv, &xv),
        _ => {
            // Non-numeric equality falls back to structural bytes.
            let equal = object::same(&vm.rt.object_vec(y), &vm.rt.object_vec(x));
            if matches!(op, Tag::Eq | Tag::Ne) {
                let truth = (op == Tag::Eq) == equal;
                let id = vm.rt.make_integer(i64::from(truth))?;
                vm.rt.push(id);
                return Ok(());
            }
            vm.rt.push(y);
            vm.rt.push(x);
            return Err(Error::TypeMismatch);
        }
    };

    let truth = match op {
        Tag::Eq => ordering == Ordering::Equal,
        Tag::Ne => ordering != Ordering::Equal,
        Tag::Lt => ordering == Ordering::Less,
        Tag::Le => ordering != Ordering::Greater,
        Tag::Gt => ordering == Ordering::Greater,
        Tag::Ge => ordering != Ordering::Less,
        _ => return Err(Error::TypeMismatch),
    };
    let id = vm.rt.make_integer(i64::from(truth))?;
    vm.rt.push(id);
    Ok(())
}

fn order(y: &Num, x: &Num) -> Ordering {
    match (y, x) {
        (Num::Int(yi), Num::Int(xi)) => bignum::cmp(yi, xi, false),
        _ if matches!(y, Num::Dec(_)) || matches!(x, Num::Dec(_)) => {
            decimal::cmp(&as_decimal(y), &as_decimal(x))
        }
        _ => {
            let yr = as_rational(y);
            let xr = as_rational(x);
            match (yr, xr) {
                (Some(yr), Some(xr)) => fraction::cmp(&yr, &xr),
                _ => decimal::cmp(&as_decimal(y), &as_decimal(x)),
            }
        }
    }
}

// ----------------------------------------------------------------------------
//   Logic and bitwise
// ----------------------------------------------------------------------------

/// And/Or/Xor: bitwise when either operand is based, logical otherwise.
pub fn logic(vm: &mut Vm, op: Tag) -> Result<()> {
    let x = vm.rt.pop()?;
    let y = match vm.rt.pop() {
        Ok(id) => id,
        Err(e) => {
            vm.rt.push(x);
            return Err(e);
        }
    };
    let ytag = vm.rt.tag(y);
    let xtag = vm.rt.tag(x);
    if ytag.is_based() || xtag.is_based() {
        let yv = bignum::read_int(&vm.rt, y)?;
        let xv = bignum::read_int(&vm.rt, x)?;
        let result = match op {
            Tag::And => bignum::bit_and(&yv, &xv, &vm.settings),
            Tag::Or => bignum::bit_or(&yv, &xv, &vm.settings),
            Tag::Xor => bignum::bit_xor(&yv, &xv, &vm.settings),
            _ => return Err(Error::TypeMismatch),
        };
        return push_num(vm, Num::Int(result));
    }

    let yt = truthy(vm, y)?;
    let xt = truthy(vm, x)?;
    let truth = match op {
        Tag::And => yt && xt,
        Tag::Or => yt || xt,
        Tag::Xor => yt != xt,
        _ => return Err(Error::TypeMismatch),
    };
    let id = vm.rt.make_integer(i64::from(truth))?;
    vm.rt.push(id);
    Ok(())
}

/// Logical (or bitwise, for based) complement of the top of stack.
pub fn not(vm: &mut Vm) -> Result<()> {
    let x = vm.rt.pop()?;
    let tag = vm.rt.tag(x);
    if tag.is_based() || tag.is_integer() {
        let xv = bignum::read_int(&vm.rt, x)?;
        let result = bignum::not(&xv, &vm.settings);
        return push_num(vm, Num::Int(result));
    }
    let truth = !truthy(vm, x)?;
    let id = vm.rt.make_integer(i64::from(truth))?;
    vm.rt.push(id);
    Ok(())
}

/// Truthiness: numeric zero is false, other numerics true; non-empty
/// text is true; a symbol defers to its binding.
pub fn truthy(vm: &Vm, id: ObjectId) -> Result<bool> {
    let tag = vm.rt.tag(id);
    if let Some(value) = read_num(vm, id)? {
        return Ok(match value {
            Num::Int(i) => !i.is_zero(),
            Num::Rat(r) => !r.is_zero(),
            Num::Dec(d) => !d.is_zero(),
        });
    }
    match tag {
        Tag::Text => Ok(!object::text_str(vm.rt.bytes(id))?.is_empty()),
        Tag::Symbol => {
            let name = object::text_str(vm.rt.bytes(id))?.to_string();
            let bound = vm.rt.lookup(&name).ok_or(Error::UndefinedName)?;
            truthy(vm, bound)
        }
        _ => Ok(true),
    }
}

// ----------------------------------------------------------------------------
//   Unary operations
// ----------------------------------------------------------------------------

pub fn unary(vm: &mut Vm, op: Tag) -> Result<()> {
    let x = vm.rt.pop()?;
    if is_complex(vm.rt.tag(x)) {
        let result: Result<()> = (|| {
            let (re, im) = read_complex(vm, x)?;
            match op {
                Tag::Neg => {
                    let re = numeric_unary(vm, Tag::Neg, &re)?;
                    let im = numeric_unary(vm, Tag::Neg, &im)?;
                    make_complex(vm, re, im)
                }
                Tag::Abs => {
                    let rr = numeric_binary(vm, Tag::Mul, &re, &re)?;
                    let ii = numeric_binary(vm, Tag::Mul, &im, &im)?;
                    let norm = numeric_binary(vm, Tag::Add, &rr, &ii)?;
                    let value = crate::transcend::apply(Tag::Sqrt, &as_decimal(&norm))?;
                    let id = decimal::make_decimal(&mut vm.rt, value)?;
                    vm.rt.push(id);
                    Ok(())
                }
                _ => Err(Error::TypeMismatch),
            }
        })();
        if result.is_err() {
            vm.rt.push(x);
        }
        return result;
    }
    if is_symbolic(vm.rt.tag(x)) {
        let xbytes = vm.rt.object_vec(x);
        let body = stax_symbolic::expr::quoted(&xbytes)?;
        let body = stax_symbolic::expr::unary(op, &body);
        let id = stax_symbolic::make_expression(&mut vm.rt, &body)?;
        vm.rt.push(id);
        return Ok(());
    }
    let Some(value) = read_num(vm, x)? else {
        vm.rt.push(x);
        return Err(Error::TypeMismatch);
    };
    match numeric_unary(vm, op, &value) {
        Ok(result) => push_num(vm, result),
        Err(e) => {
            vm.rt.push(x);
            Err(e)
        }
    }
}

fn numeric_unary(vm: &Vm, op: Tag, value: &Num) -> Result<Num> {
    match op {
        Tag::Neg => Ok(match value {
            Num::Int(i) => Num::Int(bignum::neg(i, &vm.settings)),
            Num::Rat(r) => Num::Rat(Rational::new(!r.neg, r.num.clone(), r.den.clone())?),
            Num::Dec(d) => Num::Dec(d.neg()),
        }),
        Tag::Abs => Ok(match value {
            Num::Int(i) => Num::Int(Int::new(false, i.based, i.mag.clone())),
            Num::Rat(r) => Num::Rat(Rational::new(false, r.num.clone(), r.den.clone())?),
            Num::Dec(d) => Num::Dec(d.abs()),
        }),
        Tag::Inv => match value {
            Num::Int(i) => {
                let one = Rational::from_i64(1);
                Ok(Num::Rat(fraction::div(&one, &Rational::from_int(i))?))
            }
            Num::Rat(r) => Ok(Num::Rat(fraction::div(&Rational::from_i64(1), r)?)),
            Num::Dec(d) => Ok(Num::Dec(decimal::div(&Decimal::from_i64(1), d)?)),
        },
        Tag::Sq => match value {
            Num::Int(i) => Ok(Num::Int(bignum::mul(i, i, &vm.settings)?)),
            Num::Rat(r) => Ok(Num::Rat(fraction::mul(r, r)?)),
            Num::Dec(d) => Ok(Num::Dec(decimal::mul(d, d))),
        },
        Tag::Sqrt | Tag::Sin | Tag::Cos | Tag::Tan | Tag::Exp | Tag::Ln => {
            let result = crate::transcend::apply(op, &as_decimal(value))?;
            Ok(Num::Dec(result))
        }
        _ => Err(Error::TypeMismatch),
    }
}
