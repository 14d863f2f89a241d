/// A producer and consumer pair, returned by the various `produce` constructors.
pub struct Produce<P, C> {
	pub producer: P,
	pub consumer: C,
}
