mod annotations;
mod canonical;
mod constants;
mod hierarchy;
mod imports;
mod nesting;
mod pipeline;
mod support;
