pub unsafe fn into_ptr<T>(t: T) -> *mut T {
    Box::into_raw(Box::new(t))
}

pub unsafe fn destroy<T>(ptr: *mut T) {
    drop(Box::from_raw(ptr))
}
