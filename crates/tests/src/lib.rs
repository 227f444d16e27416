pub mod fixtures;

#[cfg(test)]
mod local_provider_tests;
#[cfg(test)]
mod logo_tests;
#[cfg(test)]
mod remote_provider_tests;
