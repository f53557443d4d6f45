pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod jobs;
pub(crate) mod stocks;
pub(crate) mod watchlists;
