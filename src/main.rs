#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    business_board_lib::run();
}
