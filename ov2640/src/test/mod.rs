
pub(crate) use i2c_mock::{
    I2cOperation, MockError, MockSensorBus, MOCK_PRODUCT_ID, MOCK_PRODUCT_VERSION,
};
pub(crate) use peripherals::{MockCapture, MockClock, MockDelay};
