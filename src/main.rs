use entropy_cafe::run;

fn main() {
    run().unwrap();
}
