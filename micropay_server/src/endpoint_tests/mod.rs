mod accounts;
mod helpers;
mod mocks;
mod recharges;
mod webhooks;
