//! 图像特征噪声水平对自动门控的影响.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Warn).expect("Logger initialization error");
    runner::run().analyze();
}
