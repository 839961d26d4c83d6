#![allow(missing_docs)]

pub(crate) mod remote;

pub(crate) use remote::FakeRemote;
