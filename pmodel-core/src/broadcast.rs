//! Scalar-or-grid fields and explicit broadcasting
//!
//! Every P-model quantity may be a scalar, a 2-D (lat × lon) grid or a higher
//! dimensional cube. All of them are represented as a [`Field`], a
//! dynamically-dimensioned [`ndarray`] array, with scalars stored as
//! 0-dimensional arrays.
//!
//! Element-wise formulas combine fields following NumPy broadcasting rules:
//! trailing axes are aligned and each pair of axis lengths must either match
//! or contain a 1. The combined shape is always resolved up front by
//! [`broadcast_shape`] so that incompatible inputs surface as a
//! [`PModelError::ShapeMismatch`] rather than a panic inside ndarray.
//!
//! ```rust
//! use pmodel_core::broadcast::{map2, scalar, Field};
//! use ndarray::array;
//!
//! let grid: Field = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
//! let scaled = map2("example", &grid, &scalar(10.0), |a, b| a * b).unwrap();
//! assert_eq!(scaled.shape(), &[2, 2]);
//! assert_eq!(scaled[[1, 1]], 40.0);
//! ```

use crate::errors::{PModelError, PModelResult};
use ndarray::{arr0, ArrayD, ArrayViewD, Zip};

/// Floating point type used throughout the model
pub type FloatValue = f64;

/// A scalar or gridded model quantity
pub type Field = ArrayD<FloatValue>;

/// Wrap a single value as a 0-dimensional field
pub fn scalar(value: FloatValue) -> Field {
    arr0(value).into_dyn()
}

/// Whether a field holds exactly one value
pub fn is_scalar(field: &Field) -> bool {
    field.len() == 1
}

/// Resolve the common shape of a set of fields.
///
/// # Errors
///
/// Returns [`PModelError::ShapeMismatch`] naming `context` and every input shape
/// when any pair of aligned axes differs and neither is 1.
pub fn broadcast_shape(context: &'static str, shapes: &[&[usize]]) -> PModelResult<Vec<usize>> {
    let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut combined = vec![1usize; ndim];

    for shape in shapes {
        let offset = ndim - shape.len();
        for (axis, &len) in shape.iter().enumerate() {
            let slot = &mut combined[offset + axis];
            if *slot == 1 {
                *slot = len;
            } else if len != 1 && len != *slot {
                return Err(PModelError::ShapeMismatch {
                    context,
                    shapes: shapes.iter().map(|s| s.to_vec()).collect(),
                });
            }
        }
    }
    Ok(combined)
}

/// Check that a set of fields can be broadcast together without computing anything
pub fn check_broadcast(context: &'static str, fields: &[&Field]) -> PModelResult<Vec<usize>> {
    let shapes: Vec<&[usize]> = fields.iter().map(|f| f.shape()).collect();
    broadcast_shape(context, &shapes)
}

fn view<'a>(
    context: &'static str,
    field: &'a Field,
    shape: &[usize],
) -> PModelResult<ArrayViewD<'a, FloatValue>> {
    field
        .broadcast(shape)
        .ok_or_else(|| PModelError::ShapeMismatch {
            context,
            shapes: vec![field.shape().to_vec(), shape.to_vec()],
        })
}

/// Apply a function to every element of a single field
pub fn map1<F>(field: &Field, f: F) -> Field
where
    F: Fn(FloatValue) -> FloatValue,
{
    field.mapv(f)
}

/// Broadcast two fields together and combine them element-wise
pub fn map2<R, F>(context: &'static str, a: &Field, b: &Field, f: F) -> PModelResult<ArrayD<R>>
where
    F: Fn(FloatValue, FloatValue) -> R,
{
    let shape = broadcast_shape(context, &[a.shape(), b.shape()])?;
    let (a, b) = (view(context, a, &shape)?, view(context, b, &shape)?);
    Ok(Zip::from(&a).and(&b).map_collect(|&a, &b| f(a, b)))
}

/// Broadcast three fields together and combine them element-wise
pub fn map3<R, F>(
    context: &'static str,
    a: &Field,
    b: &Field,
    c: &Field,
    f: F,
) -> PModelResult<ArrayD<R>>
where
    F: Fn(FloatValue, FloatValue, FloatValue) -> R,
{
    let shape = broadcast_shape(context, &[a.shape(), b.shape(), c.shape()])?;
    let a = view(context, a, &shape)?;
    let b = view(context, b, &shape)?;
    let c = view(context, c, &shape)?;
    Ok(Zip::from(&a)
        .and(&b)
        .and(&c)
        .map_collect(|&a, &b, &c| f(a, b, c)))
}

/// Broadcast four fields together and combine them element-wise
pub fn map4<R, F>(
    context: &'static str,
    a: &Field,
    b: &Field,
    c: &Field,
    d: &Field,
    f: F,
) -> PModelResult<ArrayD<R>>
where
    F: Fn(FloatValue, FloatValue, FloatValue, FloatValue) -> R,
{
    let shape = broadcast_shape(context, &[a.shape(), b.shape(), c.shape(), d.shape()])?;
    let a = view(context, a, &shape)?;
    let b = view(context, b, &shape)?;
    let c = view(context, c, &shape)?;
    let d = view(context, d, &shape)?;
    Ok(Zip::from(&a)
        .and(&b)
        .and(&c)
        .and(&d)
        .map_collect(|&a, &b, &c, &d| f(a, b, c, d)))
}

/// Broadcast five fields together and combine them element-wise
pub fn map5<R, F>(
    context: &'static str,
    a: &Field,
    b: &Field,
    c: &Field,
    d: &Field,
    e: &Field,
    f: F,
) -> PModelResult<ArrayD<R>>
where
    F: Fn(FloatValue, FloatValue, FloatValue, FloatValue, FloatValue) -> R,
{
    let shape = broadcast_shape(
        context,
        &[a.shape(), b.shape(), c.shape(), d.shape(), e.shape()],
    )?;
    let a = view(context, a, &shape)?;
    let b = view(context, b, &shape)?;
    let c = view(context, c, &shape)?;
    let d = view(context, d, &shape)?;
    let e = view(context, e, &shape)?;
    Ok(Zip::from(&a)
        .and(&b)
        .and(&c)
        .and(&d)
        .and(&e)
        .map_collect(|&a, &b, &c, &d, &e| f(a, b, c, d, e)))
}

/// Replace infinities with NaN so that derived diagnostics are either finite or masked
pub fn mask_non_finite(field: Field) -> Field {
    field.mapv_into(|v| if v.is_finite() { v } else { FloatValue::NAN })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    #[test]
    fn test_scalar_is_zero_dimensional() {
        let s = scalar(3.5);
        assert_eq!(s.ndim(), 0);
        assert!(is_scalar(&s));
        assert_eq!(s.sum(), 3.5);
    }

    #[test]
    fn test_broadcast_shape_rules() {
        assert_eq!(broadcast_shape("t", &[&[], &[]]).unwrap(), Vec::<usize>::new());
        assert_eq!(broadcast_shape("t", &[&[3], &[]]).unwrap(), vec![3]);
        assert_eq!(broadcast_shape("t", &[&[2, 3], &[3]]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shape("t", &[&[2, 1], &[1, 4]]).unwrap(), vec![2, 4]);
        assert_eq!(
            broadcast_shape("t", &[&[5, 2, 3], &[2, 3], &[]]).unwrap(),
            vec![5, 2, 3]
        );
    }

    #[test]
    fn test_broadcast_shape_mismatch() {
        let err = broadcast_shape("t", &[&[2, 3], &[3, 2]]).unwrap_err();
        assert_eq!(
            err,
            PModelError::ShapeMismatch {
                context: "t",
                shapes: vec![vec![2, 3], vec![3, 2]],
            }
        );
        assert!(broadcast_shape("t", &[&[4], &[3]]).is_err());
    }

    #[test]
    fn test_map2_grid_and_scalar() {
        let grid = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
        let out = map2("t", &grid, &scalar(2.0), |a, b| a + b).unwrap();
        assert_eq!(out, array![[3.0, 4.0, 5.0], [6.0, 7.0, 8.0]].into_dyn());
    }

    #[test]
    fn test_map2_row_against_grid() {
        let grid = Array::from_elem((2, 3), 1.0).into_dyn();
        let row = array![1.0, 2.0, 3.0].into_dyn();
        let out = map2("t", &grid, &row, |a, b| a * b).unwrap();
        assert_eq!(out, array![[1.0, 2.0, 3.0], [1.0, 2.0, 3.0]].into_dyn());
    }

    #[test]
    fn test_map3_rejects_incompatible_shapes() {
        let a = Array::zeros((2, 3)).into_dyn();
        let b = Array::zeros((3, 2)).into_dyn();
        let result = map3("t", &a, &scalar(1.0), &b, |x, y, z| x + y + z);
        assert!(matches!(result, Err(PModelError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_map5_scalars_stay_scalar() {
        let one = scalar(1.0);
        let out = map5("t", &one, &one, &one, &one, &one, |a, b, c, d, e| {
            a + b + c + d + e
        })
        .unwrap();
        assert_eq!(out.ndim(), 0);
        assert_eq!(out.sum(), 5.0);
    }

    #[test]
    fn test_mask_non_finite() {
        let f = array![1.0, FloatValue::INFINITY, FloatValue::NEG_INFINITY].into_dyn();
        let masked = mask_non_finite(f);
        assert_eq!(masked[[0]], 1.0);
        assert!(masked[[1]].is_nan());
        assert!(masked[[2]].is_nan());
    }
}
