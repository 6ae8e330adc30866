//! Textos que se devuelven a los usuarios de Discord.

pub mod replies;

pub use replies::Reply;
