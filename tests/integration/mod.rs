mod helpers;
mod test_cli;
mod test_forks;
mod test_packages;
mod test_promote;
mod test_stable;
mod test_tags;
