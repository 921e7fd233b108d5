/// Status codes returned across the C ABI boundary (spec.md §6).
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fv1Result {
    Ok = 0,
    Utf8Error = 1,
    AssemblyFailed = 2,
    OutOfRange = 3,
}
