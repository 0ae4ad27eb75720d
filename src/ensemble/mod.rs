mod broadcast;
mod mean;
mod vote;

pub use broadcast::*;
pub use mean::*;
pub use vote::*;

use crate::{
    error::Error,
    tensor::{element_count, Tensor},
    Result,
};

/// Combines the predictions of M models for the same input into one.
/// Implementations keep no state between calls.
pub trait Ensemble {
    fn combine(&self, members: &[Tensor]) -> Result<Tensor>;
}

// Every member must share one shape and hold exactly that many values;
// returns the shape.
fn member_shape(members: &[Tensor]) -> Result<&[usize]> {
    let first = members
        .first()
        .ok_or_else(|| Error::invalid("ensemble needs at least one member"))?;

    for (i, member) in members.iter().enumerate() {
        check_len(member, &format!("member {i}"))?;
        if member.shape() != first.shape() {
            return Err(Error::invalid(format!(
                "member {i} has shape {:?}, member 0 has {:?}",
                member.shape(),
                first.shape()
            )));
        }
    }
    Ok(first.shape())
}

// `data` is public, so its length can drift from the shape.
fn check_len(tensor: &Tensor, what: &str) -> Result<()> {
    let n = element_count(tensor.shape());
    if tensor.len() != n {
        return Err(Error::invalid(format!(
            "{what} has shape {:?} ({n} elements) but holds {} values",
            tensor.shape(),
            tensor.len()
        )));
    }
    Ok(())
}
