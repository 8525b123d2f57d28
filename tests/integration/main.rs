//! End-to-end runs over the embedded sample data.

mod newsletter_run;
mod pipeline;
