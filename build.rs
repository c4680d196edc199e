fn main() {
    slint_build::compile("ui/app.slint").expect("Slint UI 编译失败");
}
