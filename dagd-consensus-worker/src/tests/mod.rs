// Copyright (c) 2022 MASSA LABS <info@massa.net>

mod scenarios_selected_chain;
mod scenarios_staging;
pub mod tools;
