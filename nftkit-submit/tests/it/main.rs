mod stream;
mod submitter;
